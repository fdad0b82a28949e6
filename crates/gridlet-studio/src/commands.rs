//! Line commands read from stdin.
//!
//! | Input | Effect |
//! |-------|--------|
//! | `render`, `r`, empty line | force a re-render (restart when animating) |
//! | `preset <name>`, `p <name>` | load a preset |
//! | `presets` | list presets |
//! | `help`, `?` | list commands |
//! | `quit`, `q`, `exit` | end the session |

use gridlet_engine::core::{SessionEvent, Variant};
use gridlet_engine::presets::PRESETS;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Post(SessionEvent),
    ListPresets,
    Help,
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };
    match (word.to_ascii_lowercase().as_str(), rest) {
        ("" | "r" | "render", "") => Ok(Command::Post(SessionEvent::ForceRender)),
        ("p" | "preset", "") => Err("usage: preset <name>".to_string()),
        ("p" | "preset", name) => Ok(Command::Post(SessionEvent::SelectPreset(name.to_string()))),
        ("presets", "") => Ok(Command::ListPresets),
        ("help" | "?", "") => Ok(Command::Help),
        ("q" | "quit" | "exit", "") => Ok(Command::Post(SessionEvent::Shutdown)),
        _ => Err(format!("unknown command `{line}` (try `help`)")),
    }
}

fn preset_listing(variant: Variant) -> String {
    PRESETS
        .iter()
        .map(|p| {
            let marker = if p.animated == variant.is_animated() { ' ' } else { '*' };
            format!("{marker} {}", p.name)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

const HELP: &str = "commands: render | preset <name> | presets | quit";

/// Reads commands until stdin closes or the session stops listening.
pub async fn read_commands(events: mpsc::UnboundedSender<SessionEvent>, variant: Variant) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                log::debug!("stdin closed; commands disabled");
                return;
            }
            Err(e) => {
                log::warn!("stdin: {e}");
                return;
            }
        };
        match parse_command(&line) {
            Ok(Command::Post(event)) => {
                if events.send(event).is_err() {
                    return;
                }
            }
            Ok(Command::ListPresets) => {
                println!("{}\n(* = written for the other mode)", preset_listing(variant));
            }
            Ok(Command::Help) => println!("{HELP}"),
            Err(msg) => eprintln!("{msg}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(line: &str) -> SessionEvent {
        match parse_command(line) {
            Ok(Command::Post(e)) => e,
            other => panic!("{line:?} parsed as {other:?}"),
        }
    }

    #[test] fn render_aliases() {
        assert_eq!(post("render"), SessionEvent::ForceRender);
        assert_eq!(post(" r "), SessionEvent::ForceRender);
        assert_eq!(post(""), SessionEvent::ForceRender);
    }
    #[test] fn preset_takes_name() {
        assert_eq!(post("preset  rings"), SessionEvent::SelectPreset("rings".into()));
        assert_eq!(post("P wave"), SessionEvent::SelectPreset("wave".into()));
    }
    #[test] fn preset_without_name() { assert!(parse_command("preset").is_err()); }
    #[test] fn quit_aliases() {
        for q in ["q", "quit", "EXIT"] {
            assert_eq!(post(q), SessionEvent::Shutdown);
        }
    }
    #[test] fn listing_and_help() {
        assert_eq!(parse_command("presets"), Ok(Command::ListPresets));
        assert_eq!(parse_command("?"), Ok(Command::Help));
    }
    #[test] fn unknown_command() { assert!(parse_command("render now").is_err()); }

    #[test]
    fn listing_marks_other_mode() {
        let text = preset_listing(Variant::Still);
        assert!(text.contains("  diagonal"));
        assert!(text.contains("* wave"));
    }
}
