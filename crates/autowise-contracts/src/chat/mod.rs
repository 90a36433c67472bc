mod command_parser;
mod command_registry;
mod transcript;

pub use command_parser::{parse_command, Command};
pub use command_registry::CHAT_HELP_COMMANDS;
pub use transcript::{ChatRole, ChatTranscript, ChatTurn};
