//! Session commands: login, logout, whoami and account updates

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use tracing::info;

use super::{AppContext, NOT_LOGGED_IN};
use crate::auth::AccountForm;

pub async fn run_login(ctx: &AppContext, username: &str, password: Option<&str>) -> Result<()> {
    let user = ctx.auth.login(username, password.unwrap_or_default()).await?;
    println!("{} Logged in as {}", "✅".green(), user.display_name().bold());
    Ok(())
}

pub fn run_logout(ctx: &AppContext) -> Result<()> {
    let was_authenticated = ctx.auth.is_authenticated();
    ctx.auth.logout();
    if was_authenticated {
        println!("👋 Logged out");
    } else {
        println!("Not logged in");
    }
    Ok(())
}

pub fn run_whoami(ctx: &AppContext, json: bool) -> Result<()> {
    if !ctx.auth.is_authenticated() {
        bail!(NOT_LOGGED_IN);
    }
    let user = ctx.auth.current_user();

    if json {
        let output = serde_json::json!({ "authenticated": true, "user": user });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    match user {
        Some(user) => {
            println!("{}", user.display_name().bold());
            println!("  username: {}", user.username);
            println!("  id:       {}", user.id);
        }
        None => println!("Logged in (no cached profile)"),
    }
    Ok(())
}

/// Fields of the account form; anything left out keeps its current value
#[derive(Args, Debug, Clone, Default)]
pub struct AccountArgs {
    /// New username
    #[arg(long)]
    pub username: Option<String>,
    /// New full name; an empty value is not sent
    #[arg(long)]
    pub full_name: Option<String>,
    /// Current password, required to set a new one
    #[arg(long)]
    pub current_password: Option<String>,
    #[arg(long)]
    pub new_password: Option<String>,
    #[arg(long)]
    pub confirm_password: Option<String>,
}

impl AccountArgs {
    /// Fill the form from the cached profile, then apply the given fields
    pub fn into_form(self, base: AccountForm) -> AccountForm {
        AccountForm {
            username: self.username.unwrap_or(base.username),
            full_name: self.full_name.unwrap_or(base.full_name),
            current_password: self.current_password.unwrap_or(base.current_password),
            new_password: self.new_password.unwrap_or(base.new_password),
            confirm_password: self.confirm_password.unwrap_or(base.confirm_password),
        }
    }
}

pub async fn run_account(ctx: &AppContext, args: AccountArgs) -> Result<()> {
    if !ctx.auth.is_authenticated() {
        bail!(NOT_LOGGED_IN);
    }
    let base = ctx
        .auth
        .current_user()
        .map(|user| AccountForm::for_user(&user))
        .unwrap_or_default();
    let form = args.into_form(base);

    let user = ctx.auth.update_account(&form).await?;
    info!(user_id = user.id, "Account updated");
    println!("{} Account updated: {}", "✅".green(), user.display_name().bold());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_args_override_profile() {
        let base = AccountForm {
            username: "jdoe".to_string(),
            full_name: "John Doe".to_string(),
            ..Default::default()
        };
        let args = AccountArgs {
            full_name: Some("Jane Doe".to_string()),
            ..Default::default()
        };

        let form = args.into_form(base);
        assert_eq!(form.username, "jdoe");
        assert_eq!(form.full_name, "Jane Doe");
        assert!(form.new_password.is_empty());
    }
}
