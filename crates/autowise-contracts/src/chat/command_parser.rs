use crate::i18n::Language;
use crate::request::{EngineType, Mode, VehicleType};

use super::command_registry::{
    CommandSpec, NO_ARG_COMMANDS, PATH_COMMANDS, SETTING_COMMANDS, TEXT_ARG_COMMANDS,
};

/// One line typed into the interactive loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Noop,
    Help,
    Quit,
    ClearImage,
    Show,
    History,
    Transcript,
    /// Plain text: a refinement, a first query, or a chat turn depending on the loop.
    Text(String),
    NewQuery(String),
    Refine(String),
    SetMode(Mode),
    SetLanguage(Language),
    SetVehicle(VehicleType),
    SetEngine(EngineType),
    SetImage(String),
    Invalid { command: String, reason: String },
    Unknown { command: String, arg: String },
}

fn find_action(command: &str, specs: &[CommandSpec]) -> Option<&'static str> {
    specs
        .iter()
        .find(|spec| spec.command == command)
        .map(|spec| spec.action)
}

fn parse_path_args(arg: &str) -> Vec<String> {
    if arg.trim().is_empty() {
        return Vec::new();
    }
    match shell_words::split(arg) {
        Ok(parts) => parts
            .into_iter()
            .filter(|value| !value.is_empty())
            .collect(),
        Err(_) => arg
            .split_whitespace()
            .map(str::to_string)
            .filter(|value| !value.is_empty())
            .collect(),
    }
}

fn parse_single_path_arg(arg: &str) -> String {
    let parts = parse_path_args(arg);
    match parts.len() {
        0 => String::new(),
        1 => parts[0].clone(),
        _ => parts.join(" "),
    }
}

fn no_arg_command(action: &str) -> Command {
    match action {
        "help" => Command::Help,
        "quit" => Command::Quit,
        "clear_image" => Command::ClearImage,
        "show" => Command::Show,
        "history" => Command::History,
        _ => Command::Transcript,
    }
}

fn setting_command(command: &str, action: &str, arg: &str) -> Command {
    let parsed = match action {
        "set_mode" => arg.parse::<Mode>().map(Command::SetMode),
        "set_language" => arg.parse::<Language>().map(Command::SetLanguage),
        "set_vehicle" => arg.parse::<VehicleType>().map(Command::SetVehicle),
        _ => arg.parse::<EngineType>().map(Command::SetEngine),
    };
    parsed.unwrap_or_else(|reason| Command::Invalid {
        command: command.to_string(),
        reason,
    })
}

pub fn parse_command(text: &str) -> Command {
    let raw_trimmed = text.trim();
    if raw_trimmed.is_empty() {
        return Command::Noop;
    }

    if let Some(slash_tail) = raw_trimmed.strip_prefix('/') {
        let command_len = slash_tail
            .chars()
            .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
            .count();
        if command_len > 0 {
            let command = slash_tail[..command_len].to_ascii_lowercase();
            let arg = slash_tail[command_len..].trim();

            if let Some(action) = find_action(&command, NO_ARG_COMMANDS) {
                return no_arg_command(action);
            }

            if let Some(action) = find_action(&command, TEXT_ARG_COMMANDS) {
                if arg.is_empty() {
                    return Command::Invalid {
                        command,
                        reason: "expected text after the command".to_string(),
                    };
                }
                return if action == "new_query" {
                    Command::NewQuery(arg.to_string())
                } else {
                    Command::Refine(arg.to_string())
                };
            }

            if let Some(action) = find_action(&command, SETTING_COMMANDS) {
                return setting_command(&command, action, arg);
            }

            if find_action(&command, PATH_COMMANDS).is_some() {
                let path = parse_single_path_arg(arg);
                if path.is_empty() {
                    return Command::Invalid {
                        command,
                        reason: "expected an image path".to_string(),
                    };
                }
                return Command::SetImage(path);
            }

            return Command::Unknown {
                command,
                arg: arg.to_string(),
            };
        }
    }

    Command::Text(raw_trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use crate::i18n::Language;
    use crate::request::{EngineType, Mode, VehicleType};

    use super::{parse_command, Command};

    #[test]
    fn blank_lines_are_noops() {
        assert_eq!(parse_command(""), Command::Noop);
        assert_eq!(parse_command("   \t"), Command::Noop);
    }

    #[test]
    fn plain_text_is_trimmed() {
        assert_eq!(
            parse_command("  engine stalls when cold \n"),
            Command::Text("engine stalls when cold".to_string())
        );
    }

    #[test]
    fn parse_no_arg_commands() {
        assert_eq!(parse_command("/help"), Command::Help);
        assert_eq!(parse_command("/QUIT"), Command::Quit);
        assert_eq!(parse_command("/exit"), Command::Quit);
        assert_eq!(parse_command("/noimage"), Command::ClearImage);
        assert_eq!(parse_command("/history"), Command::History);
        assert_eq!(parse_command("/transcript"), Command::Transcript);
    }

    #[test]
    fn parse_text_commands() {
        assert_eq!(
            parse_command("/new knocking at idle"),
            Command::NewQuery("knocking at idle".to_string())
        );
        assert_eq!(
            parse_command("/refine only when cold"),
            Command::Refine("only when cold".to_string())
        );
        assert!(matches!(parse_command("/new"), Command::Invalid { .. }));
    }

    #[test]
    fn parse_setting_commands() {
        assert_eq!(parse_command("/mode tune"), Command::SetMode(Mode::Tuning));
        assert_eq!(parse_command("/lang DE"), Command::SetLanguage(Language::De));
        assert_eq!(
            parse_command("/vehicle truck"),
            Command::SetVehicle(VehicleType::Truck)
        );
        assert_eq!(parse_command("/engine lpg"), Command::SetEngine(EngineType::Lpg));

        let Command::Invalid { command, reason } = parse_command("/lang fr") else {
            panic!("expected invalid language");
        };
        assert_eq!(command, "lang");
        assert!(reason.contains("fr"));
    }

    #[test]
    fn parse_image_quoted_path() {
        assert_eq!(
            parse_command("/image \"/tmp/my car.jpg\""),
            Command::SetImage("/tmp/my car.jpg".to_string())
        );
        assert_eq!(
            parse_command("/image dash.png"),
            Command::SetImage("dash.png".to_string())
        );
    }

    #[test]
    fn unknown_commands_keep_their_argument() {
        assert_eq!(
            parse_command("/export html"),
            Command::Unknown {
                command: "export".to_string(),
                arg: "html".to_string()
            }
        );
    }

    #[test]
    fn lone_slash_is_text() {
        assert_eq!(parse_command("/ hmm"), Command::Text("/ hmm".to_string()));
    }
}
