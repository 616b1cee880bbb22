use std::io::Write;

use anyhow::{Result, anyhow};
use log::info;

use crate::app::App;
use crate::ui;

/// Command handler for the application
pub struct CommandHandler;

impl CommandHandler {
    /// Parse and execute a command
    pub fn execute(app: &mut App, out: &mut impl Write, command_str: &str) -> Result<()> {
        let parts: Vec<&str> = command_str.trim().splitn(2, ' ').collect();
        let cmd = parts[0].to_lowercase();
        let args = parts.get(1).map(|s| s.trim()).filter(|s| !s.is_empty());

        match cmd.as_str() {
            "open" | "o" => {
                let Some(url) = args else {
                    return Err(anyhow!("Open command requires a URL argument"));
                };
                app.open_source(out, url)?;
            }
            "status" | "s" => app.redraw(out)?,
            "timers" => {
                let message = format!(
                    "Poll timers: {} running, {} at most",
                    app.observer.live_poll_timers(),
                    app.observer.peak_poll_timers()
                );
                ui::draw_message(out, &message)?;
            }
            "clear" | "stop" => {
                app.shutdown();
                ui::draw_message(out, "Stopped tracking")?;
            }
            "help" | "h" | "?" => ui::draw_help(out)?,
            "quit" | "exit" | "q" => {
                info!("Quit requested");
                app.should_quit = true;
            }
            "" => {
                // Empty command, do nothing
            }
            _ => return Err(anyhow!("Unknown command: {}", cmd)),
        }

        Ok(())
    }
}

/// Handle a command string entered by the user
pub fn handle_command(app: &mut App, out: &mut impl Write, command: &str) -> Result<()> {
    CommandHandler::execute(app, out, command)
}
