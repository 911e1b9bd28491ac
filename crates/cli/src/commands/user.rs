use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use jira_agile_api::{User, UserPermissionSearch};
use serde::Serialize;

use super::Context;

#[derive(Args, Debug, Clone)]
pub struct UserArgs {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug, Clone)]
enum UserCommand {
    /// Show a user by username
    Get {
        username: String,
    },
    /// Show the authenticated user
    Me,
    /// Create a user
    Create {
        /// Username
        #[arg(long)]
        name: String,
        /// Email address
        #[arg(long)]
        email: String,
        /// Display name (defaults to the username)
        #[arg(long)]
        display_name: Option<String>,
        /// Initial password; the server generates one when omitted
        #[arg(long, env = "JIRA_AGILE_NEW_USER_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Find users holding a set of permissions
    Search {
        #[arg(long)]
        username: Option<String>,
        /// Comma-separated permission keys, e.g. BROWSE,CREATE_ISSUES
        #[arg(long)]
        permissions: Option<String>,
        #[arg(long)]
        issue_key: Option<String>,
        #[arg(long)]
        project_key: Option<String>,
        #[arg(long)]
        start_at: Option<u32>,
        /// Page size (1000 when omitted)
        #[arg(long)]
        max_results: Option<u32>,
    },
}

#[derive(Serialize)]
struct UserRow<'a> {
    name: &'a str,
    display_name: &'a str,
    email: &'a str,
    active: Option<bool>,
}

impl<'a> From<&'a User> for UserRow<'a> {
    fn from(user: &'a User) -> Self {
        Self {
            name: user
                .name
                .as_deref()
                .or(user.account_id.as_deref())
                .unwrap_or(""),
            display_name: user.display_name.as_deref().unwrap_or(""),
            email: user.email_address.as_deref().unwrap_or(""),
            active: user.active,
        }
    }
}

pub async fn execute(args: UserArgs, ctx: &Context<'_>) -> Result<()> {
    match args.command {
        UserCommand::Get { username } => {
            let user = ctx
                .client
                .users()
                .get(&username)
                .await
                .with_context(|| format!("Failed to get user '{username}'"))?
                .into_data();
            ctx.renderer.render(&UserRow::from(&user))
        }
        UserCommand::Me => {
            let user = ctx
                .client
                .users()
                .myself()
                .await
                .context("Failed to get current user")?
                .into_data();
            ctx.renderer.render(&UserRow::from(&user))
        }
        UserCommand::Create {
            name,
            email,
            display_name,
            password,
        } => {
            let user = User {
                display_name: Some(display_name.unwrap_or_else(|| name.clone())),
                name: Some(name),
                email_address: Some(email),
                password,
                ..Default::default()
            };
            create_user(ctx, &user).await
        }
        UserCommand::Search {
            username,
            permissions,
            issue_key,
            project_key,
            start_at,
            max_results,
        } => {
            let search = UserPermissionSearch {
                username,
                permissions,
                issue_key,
                project_key,
                start_at,
                max_results,
            };
            search_users(ctx, &search).await
        }
    }
}

async fn create_user(ctx: &Context<'_>, user: &User) -> Result<()> {
    let created = ctx
        .client
        .users()
        .create(user)
        .await
        .context("Failed to create user")?
        .into_data();

    tracing::info!(key = ?created.key, "User created");
    ctx.renderer.success(&format!(
        "Created user {}",
        created.name.as_deref().or(user.name.as_deref()).unwrap_or("")
    ));
    ctx.renderer.render(&UserRow::from(&created))
}

async fn search_users(ctx: &Context<'_>, search: &UserPermissionSearch) -> Result<()> {
    let users = ctx
        .client
        .users()
        .permission_search(search)
        .await
        .context("Failed to search users")?
        .into_data();

    if users.is_empty() {
        tracing::info!("No users matched.");
        return Ok(());
    }

    let rows: Vec<UserRow<'_>> = users.iter().map(UserRow::from).collect();
    ctx.renderer.render(&rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_row_falls_back_to_account_id() {
        let user = User {
            account_id: Some("5b10a2844c20165700ede21g".to_string()),
            display_name: Some("Mia".to_string()),
            ..Default::default()
        };
        let row = UserRow::from(&user);
        assert_eq!(row.name, "5b10a2844c20165700ede21g");
        assert_eq!(row.email, "");
    }
}
