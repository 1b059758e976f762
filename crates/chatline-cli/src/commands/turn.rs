//! `chatline turn [--next]` — show or advance the game turn.

use anyhow::{Context as _, Result};

use super::Context;

pub async fn run(ctx: &Context, advance: bool) -> Result<()> {
    let turns = ctx.client.turns();
    let result = if advance {
        turns.next_turn().await
    } else {
        turns.current_turn().await
    };

    match result {
        Ok(player) => {
            println!("{player}");
            Ok(())
        }
        Err(e) if e.needs_login() => Err(ctx.login_required()),
        Err(e) => Err(e).context("failed to query turn"),
    }
}
