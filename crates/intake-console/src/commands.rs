//! REPL input parsing.

/// One line of console input, parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// A plain chat message.
    Chat(String),
    /// `/call` — toggle call mode.
    ToggleCall,
    /// `/details` — show the extracted case details.
    Details,
    /// `/log` — show the diagnostic ring.
    ShowLog,
    /// `/clear-log` — empty the diagnostic ring.
    ClearLog,
    /// `/help` — list commands.
    Help,
    /// `/quit` — end the session.
    Quit,
    /// Blank line; ignored.
    Empty,
    /// An unrecognized `/` command.
    Unknown(String),
}

/// Parses one input line. Unknown slash-commands are reported rather than
/// being sent to the backend as chat.
pub fn parse(line: &str) -> ReplCommand {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return ReplCommand::Empty;
    }
    if let Some(command) = trimmed.strip_prefix('/') {
        return match command {
            "call" => ReplCommand::ToggleCall,
            "details" => ReplCommand::Details,
            "log" => ReplCommand::ShowLog,
            "clear-log" => ReplCommand::ClearLog,
            "help" => ReplCommand::Help,
            "quit" | "exit" => ReplCommand::Quit,
            other => ReplCommand::Unknown(other.to_string()),
        };
    }
    ReplCommand::Chat(trimmed.to_string())
}

pub const HELP_TEXT: &str = "\
Type a message and press enter to chat.
  /call       toggle voice call mode
  /details    show extracted case details
  /log        show the diagnostic log
  /clear-log  clear the diagnostic log
  /help       show this help
  /quit       exit";
