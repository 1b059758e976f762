//! `chatline chat` — interactive chat room.
//!
//! Verifies the session, opens the channel, and bridges it to the terminal:
//! inbound messages and roster updates are printed as they arrive, stdin
//! lines are sent as chat messages. `/quit`, EOF, or Ctrl+C leaves.

use std::fmt::Display;
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use chatline_core::{ChannelState, ChatMessage, OutgoingMessage, PresenceEvent};
use chrono::{Local, TimeZone};
use tokio::sync::mpsc;
use tracing::debug;

use super::Context;

const QUIT_COMMAND: &str = "/quit";

pub async fn run(ctx: &Context) -> Result<()> {
    let mut channel = ctx.client.channel().context("failed to set up chat channel")?;
    let leaving = Arc::new(AtomicBool::new(false));

    channel.on_message(|msg| println!("{}", format_message(msg, &Local)));
    channel.on_presence(|event| println!("{}", format_roster(event)));
    {
        let leaving = leaving.clone();
        channel.on_state_change(move |state| {
            if let Some(line) = describe_state(state, leaving.load(Ordering::SeqCst)) {
                eprintln!("{line}");
            }
        });
    }

    let session = ctx.client.start(&mut channel).await.map_err(|e| ctx.session_error(e))?;
    println!(
        "Joined as {}. Type a message and press Enter; {QUIT_COMMAND} to leave.",
        session.username().unwrap_or("(unnamed)")
    );

    let mut lines = spawn_line_reader(std::io::BufReader::new(std::io::stdin()));
    loop {
        let line = tokio::select! {
            line = lines.recv() => line.transpose().context("failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };

        if line.trim() == QUIT_COMMAND {
            break;
        }
        let Some(message) = OutgoingMessage::compose(&line) else {
            continue;
        };
        if !channel.send(&message).await {
            debug!("send dropped while channel {}", channel.state());
            eprintln!("* not connected; message not sent");
        }
    }

    leaving.store(true, Ordering::SeqCst);
    channel.shutdown().await;
    Ok(())
}

/// Read lines on a plain thread and forward them. A blocked terminal read
/// cannot be cancelled, so the thread is left detached when the chat ends.
fn spawn_line_reader<R>(reader: R) -> mpsc::UnboundedReceiver<std::io::Result<String>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in reader.lines() {
            let failed = line.is_err();
            if tx.send(line).is_err() || failed {
                break;
            }
        }
    });
    rx
}

/// `[HH:MM:SS] sender: body`, with the time rendered in `tz`.
fn format_message<Tz>(msg: &ChatMessage, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let time = msg.timestamp.with_timezone(tz).format("%H:%M:%S");
    format!("[{time}] {}: {}", msg.sender, msg.body)
}

fn format_roster(event: &PresenceEvent) -> String {
    let names: Vec<&str> = event.usernames().collect();
    if names.is_empty() {
        "* online: nobody".to_string()
    } else {
        format!("* online ({}): {}", names.len(), names.join(", "))
    }
}

fn describe_state(state: ChannelState, leaving: bool) -> Option<&'static str> {
    match state {
        ChannelState::Open => Some("* connected"),
        ChannelState::Closed if !leaving => Some("* disconnected, reconnecting…"),
        _ => None,
    }
}
