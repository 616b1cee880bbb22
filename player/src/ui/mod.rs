use std::io::{self, Write};

use crossterm::queue;
use crossterm::style::{Print, PrintStyledContent, Stylize};
use watch_core::{SourceKind, TrackerStatus, WatchSnapshot};

pub const PROMPT: &str = "Please enter a valid video URL (YouTube, Vimeo, .mp4, etc.).";

/// Draw one progress line, or the status line when there is no progress to show
pub fn draw_snapshot(out: &mut impl Write, snapshot: &WatchSnapshot) -> io::Result<()> {
    match &snapshot.status {
        TrackerStatus::Idle => return Ok(()),
        TrackerStatus::Loading => {
            queue!(out, PrintStyledContent("Loading player...".yellow()), Print("\n"))?
        }
        TrackerStatus::SourceNotReady => queue!(
            out,
            PrintStyledContent("Source not ready: the URL carries no video id".yellow()),
            Print("\n")
        )?,
        TrackerStatus::Unavailable(err) => {
            queue!(out, PrintStyledContent(err.to_string().red()), Print("\n"))?
        }
        TrackerStatus::Ready => {
            let state = if snapshot.sample.is_playing {
                "playing"
            } else {
                "paused"
            };
            queue!(
                out,
                PrintStyledContent("Watch Time: ".red().bold()),
                Print(snapshot.watch_time_display()),
                Print("  "),
                PrintStyledContent("Total Duration: ".green().bold()),
                Print(snapshot.duration_display()),
                PrintStyledContent(format!("  ({})", state).dark_grey()),
                Print("\n")
            )?
        }
    }
    out.flush()
}

/// Announce which backend picked up the source
pub fn draw_tracking(out: &mut impl Write, kind: &SourceKind) -> io::Result<()> {
    let Some(backend) = kind.backend() else {
        return Ok(());
    };
    let what = match (kind, kind.video_id()) {
        (SourceKind::File(src), _) => format!("media file {}", src),
        (_, Some(id)) => format!("{} video {}", backend, id),
        (_, None) => format!("{} link without a video id", backend),
    };
    queue!(
        out,
        PrintStyledContent("Tracking ".cyan()),
        Print(what),
        Print("\n")
    )?;
    out.flush()
}

pub fn draw_prompt(out: &mut impl Write) -> io::Result<()> {
    queue!(out, PrintStyledContent(PROMPT.yellow()), Print("\n"))?;
    out.flush()
}

pub fn draw_error(out: &mut impl Write, message: &str) -> io::Result<()> {
    queue!(
        out,
        PrintStyledContent(format!("Error: {}", message).red()),
        Print("\n")
    )?;
    out.flush()
}

pub fn draw_message(out: &mut impl Write, message: &str) -> io::Result<()> {
    queue!(out, Print(message), Print("\n"))?;
    out.flush()
}

pub fn draw_help(out: &mut impl Write) -> io::Result<()> {
    let help = [
        ("<url>", "track a YouTube, Vimeo or direct media file URL"),
        (":open <url>", "same as entering the URL"),
        (":status", "show the latest progress"),
        (":timers", "show running and peak poll timers"),
        (":clear", "stop tracking the current source"),
        (":help", "show this help"),
        (":quit", "exit"),
    ];
    queue!(out, PrintStyledContent("Commands".bold()), Print("\n"))?;
    for (command, what) in help {
        queue!(
            out,
            Print("  "),
            PrintStyledContent(format!("{:<12}", command).cyan()),
            Print(what),
            Print("\n")
        )?;
    }
    out.flush()
}
