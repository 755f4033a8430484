//! Slash-command parsing for the terminal front end.

use colloquy_core::types::{Session, SessionId};

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Sessions,
    New,
    Select(String),
    Rename { target: String, name: String },
    Delete(String),
    Lang(String),
    Mic,
    Help,
    Quit,
    /// Anything that is not a command is a question.
    Ask(String),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command /{0}, try /help")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),
}

pub const HELP: &str = "\
Commands:
  /sessions              list chats
  /new                   start a new chat
  /select <n|id>         open a chat
  /rename <n|id> <name>  rename a chat
  /delete <n|id>         delete a chat
  /lang <tag>            set language (en-US, hi-IN, gu-IN)
  /mic                   toggle voice input
  /help                  show this help
  /quit                  exit
Anything else is sent as a question.";

/// Parse a line. Returns `Ok(None)` for an empty line.
pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Some(Command::Ask(line.to_string())));
    };

    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };

    let command = match name.to_ascii_lowercase().as_str() {
        "sessions" | "ls" => Command::Sessions,
        "new" => Command::New,
        "select" | "open" => Command::Select(required(args, "/select <n|id>")?),
        "delete" | "rm" => Command::Delete(required(args, "/delete <n|id>")?),
        "rename" => {
            let (target, name) = args
                .split_once(char::is_whitespace)
                .ok_or(CommandError::Usage("/rename <n|id> <name>"))?;
            Command::Rename {
                target: target.to_string(),
                name: name.trim().to_string(),
            }
        }
        "lang" => Command::Lang(required(args, "/lang <en-US|hi-IN|gu-IN>")?),
        "mic" => Command::Mic,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn required(args: &str, usage: &'static str) -> Result<String, CommandError> {
    if args.is_empty() {
        Err(CommandError::Usage(usage))
    } else {
        Ok(args.to_string())
    }
}

/// Resolve a 1-based list position or a session id against the listing.
pub fn resolve_target(sessions: &[Session], target: &str) -> Option<SessionId> {
    if let Ok(n) = target.parse::<usize>() {
        if let Some(session) = n.checked_sub(1).and_then(|i| sessions.get(i)) {
            return Some(session.id.clone());
        }
    }
    sessions
        .iter()
        .find(|s| s.id.as_str() == target)
        .map(|s| s.id.clone())
}
