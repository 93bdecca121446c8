//! Command handler boundary
//!
//! The command server hands every accepted command text to a
//! [`CommandHandler`] and frames whatever comes back.

/// Application result for one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub success: bool,
    pub payload: String,
}

impl CommandOutcome {
    pub fn ok(payload: impl Into<String>) -> Self {
        Self {
            success: true,
            payload: payload.into(),
        }
    }

    pub fn error(payload: impl Into<String>) -> Self {
        Self {
            success: false,
            payload: payload.into(),
        }
    }
}

/// Executes command text on behalf of the command server
pub trait CommandHandler {
    fn handle(&self, command: &str) -> CommandOutcome;
}

impl<F> CommandHandler for F
where
    F: Fn(&str) -> CommandOutcome,
{
    fn handle(&self, command: &str) -> CommandOutcome {
        self(command)
    }
}

/// The two commands the stock command server understands
///
/// - `status`: reports that the server is up
/// - `print "text"`: echoes `text`, surrounding quotes removed
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinHandler;

impl BuiltinHandler {
    pub const STATUS_REPLY: &'static str = "Server Status: Running - All systems operational";
}

impl CommandHandler for BuiltinHandler {
    fn handle(&self, command: &str) -> CommandOutcome {
        let command = command.trim();

        if command.is_empty() {
            return CommandOutcome::error("Empty command");
        }
        if command == "status" {
            return CommandOutcome::ok(Self::STATUS_REPLY);
        }
        if let Some(text) = command.strip_prefix("print ") {
            let text = text.trim();
            let text = text
                .strip_prefix('"')
                .and_then(|t| t.strip_suffix('"'))
                .unwrap_or(text);
            return CommandOutcome::ok(text);
        }

        CommandOutcome::error("Unknown command. Supported commands: status, print \"text\"")
    }
}
