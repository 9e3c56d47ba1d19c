//! Line-based renderer commands read from a terminal.
//!
//! Input is read on a plain OS thread rather than the async runtime's
//! blocking pool: a pending read there cannot be cancelled and would hold up
//! runtime shutdown until the next line or EOF.

use std::io::{self, BufRead};
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::monitor::UiCommand;

/// Forwards parsed commands from `input` until EOF, a read error or the
/// receiving side is dropped.
pub fn forward_commands<R: BufRead>(input: R, commands: &UnboundedSender<UiCommand>) {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("stdin read failed: {}", e);
                return;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<UiCommand>() {
            Ok(cmd) => {
                if commands.send(cmd).is_err() {
                    return;
                }
            }
            Err(e) => warn!("Ignoring console input: {}", e),
        }
    }
    debug!("stdin closed, console commands disabled");
}

/// Spawns a detached `console` thread forwarding `input` into `commands`.
pub fn spawn_console<R>(
    input: R,
    commands: UnboundedSender<UiCommand>,
) -> io::Result<JoinHandle<()>>
where
    R: BufRead + Send + 'static,
{
    thread::Builder::new()
        .name("console".to_string())
        .spawn(move || forward_commands(input, &commands))
}
