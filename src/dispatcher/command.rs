use std::fmt;

/// Operator commands understood by the bot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    Activate,
    Deactivate,
    Snapshot,
}

impl Command {
    /// Parse a command message such as `/activate` or `/pic@homewatch_bot`.
    ///
    /// Returns `None` for free text and unknown commands.
    pub fn parse(text: &str) -> Option<Self> {
        let token = text.split_whitespace().next()?.strip_prefix('/')?;
        let name = token.split('@').next().unwrap_or(token);

        match name.to_ascii_lowercase().as_str() {
            "help" => Some(Command::Help),
            "activate" => Some(Command::Activate),
            "deactivate" => Some(Command::Deactivate),
            "pic" | "snapshot" => Some(Command::Snapshot),
            _ => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Command::Help => "help",
            Command::Activate => "activate",
            Command::Deactivate => "deactivate",
            Command::Snapshot => "snapshot",
        };
        write!(f, "/{}", name)
    }
}
