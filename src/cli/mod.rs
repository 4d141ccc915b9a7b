pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "frame")]
#[command(about = "Frame CLI - database setup and maintenance")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply pending database migrations")]
    Migrate,

    #[command(about = "Replace all users, admins and admin groups with a root user, admin and group")]
    Setup {
        #[arg(long, env = "ROOT_EMAIL", help = "Email address for the root user")]
        email: String,
        #[arg(long, env = "ROOT_PASSWORD", hide_env_values = true, help = "Password for the root user")]
        password: String,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Migrate => commands::migrate::handle().await,
        Commands::Setup { email, password } => commands::setup::handle(email, password).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_setup_arguments() {
        let cli = Cli::try_parse_from(["frame", "setup", "--email", "root@example.com", "--password", "secret"]).unwrap();
        match cli.command {
            Commands::Setup { email, password } => {
                assert_eq!(email, "root@example.com");
                assert_eq!(password, "secret");
            }
            Commands::Migrate => panic!("expected setup"),
        }
    }

    #[test]
    fn parses_migrate() {
        let cli = Cli::try_parse_from(["frame", "migrate"]).unwrap();
        assert!(matches!(cli.command, Commands::Migrate));
    }
}
