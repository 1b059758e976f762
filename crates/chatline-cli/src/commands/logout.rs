//! `chatline logout` — end the server session and forget the cookie.

use anyhow::{Context as _, Result};
use tracing::warn;

use super::Context;

pub async fn run(ctx: &Context) -> Result<()> {
    if ctx.client.cookie_header().is_some() {
        // Local state is cleared even if this fails.
        if let Err(e) = ctx.client.auth().logout().await {
            warn!("server logout failed: {e}");
        }
    }

    let removed = ctx
        .store
        .clear()
        .with_context(|| format!("failed to remove {}", ctx.store.path().display()))?;

    if removed {
        println!("Logged out");
    } else {
        println!("Not logged in");
    }
    Ok(())
}
