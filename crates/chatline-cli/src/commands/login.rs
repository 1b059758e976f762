//! `chatline login` — sign in and store the session cookie.
//!
//! Missing credentials are prompted for. `--guest` signs in under the given
//! name, or a generated `GuestNNNN` one, with an empty password.

use anyhow::{Context as _, Result};
use chatline_client::LoginOutcome;
use dialoguer::{Input, Password};
use tracing::{info, warn};

use super::Context;

pub async fn run(
    ctx: &Context,
    username: Option<String>,
    password: Option<String>,
    guest: bool,
) -> Result<()> {
    let auth = ctx.client.auth();

    let (name, outcome) = if guest {
        auth.guest_login(username.as_deref())
            .await
            .context("guest login failed")?
    } else {
        let username = match username {
            Some(u) => u,
            None => Input::<String>::new()
                .with_prompt("Username")
                .interact_text()
                .context("failed to read username")?,
        };
        let password = match password {
            Some(p) => p,
            None => Password::new()
                .with_prompt("Password")
                .allow_empty_password(true)
                .interact()
                .context("failed to read password")?,
        };
        let outcome = auth.login(&username, &password).await.context("login failed")?;
        (username, outcome)
    };

    persist(ctx, &outcome)?;
    info!(username = %name, "login complete");

    println!("Logged in as {name}");
    println!("  Landing: {}", outcome.landing);
    Ok(())
}

fn persist(ctx: &Context, outcome: &LoginOutcome) -> Result<()> {
    match outcome.cookie.as_deref() {
        Some(cookie) => ctx
            .store
            .save(cookie)
            .with_context(|| format!("failed to save session to {}", ctx.store.path().display())),
        None => {
            warn!("server accepted the login but set no session cookie");
            Ok(())
        }
    }
}
