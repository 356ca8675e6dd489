//! Sign-in commands.

use secrecy::SecretString;
use shopease_client::{ClientError, require_auth};

use super::{CliError, Context};
use crate::views;

const PASSWORD_ENV: &str = "SHOPEASE_PASSWORD";

/// Sign in. The password comes from `SHOPEASE_PASSWORD` or a prompt.
pub async fn login(ctx: &Context, email: &str) -> Result<(), CliError> {
    let password = match std::env::var(PASSWORD_ENV) {
        Ok(password) => SecretString::from(password),
        Err(_) => views::prompt_secret("Password: ")?,
    };

    let user = ctx.store.login(email, &password).await?;
    ctx.store.notifier().success("Login successful");
    views::user(&user);
    Ok(())
}

pub async fn logout(ctx: &Context) -> Result<(), CliError> {
    ctx.store.logout().await?;
    ctx.store.notifier().success("Logged out");
    Ok(())
}

pub async fn whoami(ctx: &Context) -> Result<(), CliError> {
    require_auth(ctx.store.session()).await?;
    let user = ctx
        .store
        .session()
        .user()
        .await
        .ok_or(ClientError::NotAuthenticated)?;
    views::user(&user);
    Ok(())
}
