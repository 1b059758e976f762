//! `chatline whoami` — show who the server thinks we are.

use anyhow::Result;

use super::Context;

pub async fn run(ctx: &Context) -> Result<()> {
    match ctx.client.gate().resolve_session().await {
        Ok(session) => {
            println!("{}", session.username().unwrap_or("(unnamed)"));
            Ok(())
        }
        Err(e) => Err(ctx.session_error(e)),
    }
}
