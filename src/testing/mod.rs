use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::database::models::{new_id, Admin, HydratedRoles, Link, Name, Roles, Session, User};
use crate::mailer::{Mailer, MailerError, OutgoingEmail};
use crate::middleware::auth::AuthCredentials;

/// Keeps every delivered email in memory
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn deliver(&self, email: OutgoingEmail) -> Result<(), MailerError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(email);
        }
        Ok(())
    }
}

pub fn user(username: &str, roles: Roles) -> User {
    User {
        id: new_id(),
        is_active: true,
        username: username.to_string(),
        password: String::new(),
        email: format!("{}@stimpy.show", username),
        roles,
        reset_token: None,
        reset_expires: None,
        time_created: Utc::now(),
    }
}

pub fn admin(name: &str, groups: &[(&str, &str)]) -> Admin {
    Admin {
        id: new_id(),
        name: Name::parse(name),
        user_link: None,
        groups: groups
            .iter()
            .map(|(id, name)| (id.to_string(), name.to_string()))
            .collect::<BTreeMap<_, _>>(),
        permissions: BTreeMap::new(),
        time_created: Utc::now(),
    }
}

pub fn session(user_id: &str) -> Session {
    Session {
        id: new_id(),
        user_id: user_id.to_string(),
        key: String::new(),
        time: Utc::now(),
        last_active: Utc::now(),
        ip: "127.0.0.1".to_string(),
        browser: "Chrome".to_string(),
        os: "Linux".to_string(),
    }
}

/// Credentials for an admin user who belongs to `groups`
pub fn admin_credentials(groups: &[(&str, &str)]) -> AuthCredentials {
    let admin = admin("Ren Hoek", groups);
    let user = user(
        "ren",
        Roles {
            account: None,
            admin: Some(Link { id: admin.id.clone(), name: admin.full_name() }),
        },
    );
    AuthCredentials {
        scope: user.roles.scope(),
        session: session(&user.id),
        roles: HydratedRoles { account: None, admin: Some(admin) },
        user,
    }
}

/// Credentials for a customer with an account role only
pub fn account_credentials() -> AuthCredentials {
    let user = user(
        "stimpy",
        Roles {
            account: Some(Link { id: new_id(), name: "Stimpson Cat".to_string() }),
            admin: None,
        },
    );
    AuthCredentials {
        scope: user.roles.scope(),
        session: session(&user.id),
        roles: HydratedRoles::default(),
        user,
    }
}
