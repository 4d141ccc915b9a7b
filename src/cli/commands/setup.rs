use anyhow::Context;
use serde_json::json;
use std::collections::BTreeMap;

use crate::config::config;
use crate::database::models::{Admin, AdminGroup, Link, Role, User};
use crate::database::{DatabaseManager, Repository};
use crate::validation;

const ROOT_USERNAME: &str = "root";
const ROOT_GROUP: &str = "Root";
const ROOT_ADMIN: &str = "Root Admin";

/// Wipe users, admins and admin groups, then create the `root` user linked
/// to a "Root Admin" who belongs to the "Root" group
pub async fn handle(email: String, password: String) -> anyhow::Result<()> {
    let email = validation::email("email", Some(email))?;
    let password = validation::required("password", Some(password))?;

    let pool = DatabaseManager::connect(&config().database)?;
    DatabaseManager::migrate(&pool).await.context("failed to apply migrations")?;

    let users = Repository::<User>::new(&pool);
    let admins = Repository::<Admin>::new(&pool);
    let groups = Repository::<AdminGroup>::new(&pool);
    let (removed_users, removed_admins, removed_groups) = tokio::try_join!(
        users.delete_many(json!({})),
        admins.delete_many(json!({})),
        groups.delete_many(json!({})),
    )?;
    tracing::info!(
        "Removed {} users, {} admins and {} admin groups",
        removed_users,
        removed_admins,
        removed_groups
    );

    let group = AdminGroup::create(&pool, ROOT_GROUP).await?;
    let memberships = BTreeMap::from([(group.id.clone(), group.name.clone())]);
    let admin = Admin::create_with_groups(&pool, ROOT_ADMIN, &memberships).await?;
    let user = User::create(&pool, ROOT_USERNAME, &password, &email).await?;

    let user_link = Link {
        id: user.id.clone(),
        name: user.username.clone(),
    };
    let admin_link = Link {
        id: admin.id.clone(),
        name: admin.full_name(),
    };
    tokio::try_join!(
        Admin::link_user(&pool, &admin.id, &user_link),
        User::link_role(&pool, &user.id, Role::Admin, &admin_link),
    )?;

    println!("Setup complete. Log in as `{}` <{}>", user.username, user.email);
    Ok(())
}
