//! Slash command parsing for the chat REPL

/// A line typed at the REPL prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// Plain text to send to the active chat
    Message(String),
    /// Create a chat and make it active
    New,
    /// List chats
    List,
    /// Make a chat active (list index or id)
    Switch(String),
    /// Rename the active chat
    Rename(String),
    /// Delete a chat (active chat when no argument)
    Delete(Option<String>),
    /// Set the default system prompt for new chats
    System(String),
    /// Show settings
    Settings,
    /// Change one setting
    Set { key: String, value: String },
    /// Show the active chat's messages
    History,
    Help,
    Quit,
    /// Command that needs an argument it did not get
    MissingArgument(&'static str),
    Unknown(String),
}

impl ReplCommand {
    /// Parse a trimmed, non-empty input line.
    pub fn parse(line: &str) -> Self {
        let Some(rest) = line.strip_prefix('/') else {
            return ReplCommand::Message(line.to_string());
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        let arg = (!arg.is_empty()).then(|| arg.to_string());

        match (name, arg) {
            ("new" | "n", _) => ReplCommand::New,
            ("list" | "ls" | "l", _) => ReplCommand::List,
            ("switch" | "s", Some(target)) => ReplCommand::Switch(target),
            ("switch" | "s", None) => ReplCommand::MissingArgument("/switch <index|id>"),
            ("rename", Some(title)) => ReplCommand::Rename(title),
            ("rename", None) => ReplCommand::MissingArgument("/rename <title>"),
            ("delete" | "rm", target) => ReplCommand::Delete(target),
            ("system", Some(prompt)) => ReplCommand::System(prompt),
            ("system", None) => ReplCommand::MissingArgument("/system <prompt>"),
            ("settings", _) => ReplCommand::Settings,
            ("set", Some(arg)) => match arg.split_once(char::is_whitespace) {
                Some((key, value)) => ReplCommand::Set {
                    key: key.to_string(),
                    value: value.trim().to_string(),
                },
                None => ReplCommand::MissingArgument("/set <key> <value>"),
            },
            ("set", None) => ReplCommand::MissingArgument("/set <key> <value>"),
            ("history" | "show", _) => ReplCommand::History,
            ("help" | "h" | "?", _) => ReplCommand::Help,
            ("quit" | "exit" | "q", _) => ReplCommand::Quit,
            _ => ReplCommand::Unknown(line.to_string()),
        }
    }
}
