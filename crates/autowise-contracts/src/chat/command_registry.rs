#[derive(Clone, Copy, Debug)]
pub(crate) struct CommandSpec {
    pub command: &'static str,
    pub action: &'static str,
}

pub(crate) const NO_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "help",
        action: "help",
    },
    CommandSpec {
        command: "quit",
        action: "quit",
    },
    CommandSpec {
        command: "exit",
        action: "quit",
    },
    CommandSpec {
        command: "noimage",
        action: "clear_image",
    },
    CommandSpec {
        command: "show",
        action: "show",
    },
    CommandSpec {
        command: "history",
        action: "history",
    },
    CommandSpec {
        command: "transcript",
        action: "transcript",
    },
];

pub(crate) const TEXT_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "new",
        action: "new_query",
    },
    CommandSpec {
        command: "refine",
        action: "refine",
    },
];

pub(crate) const SETTING_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "mode",
        action: "set_mode",
    },
    CommandSpec {
        command: "lang",
        action: "set_language",
    },
    CommandSpec {
        command: "vehicle",
        action: "set_vehicle",
    },
    CommandSpec {
        command: "engine",
        action: "set_engine",
    },
];

pub(crate) const PATH_COMMANDS: &[CommandSpec] = &[CommandSpec {
    command: "image",
    action: "set_image",
}];

pub const CHAT_HELP_COMMANDS: &[&str] = &[
    "/new <text>",
    "/refine <text>",
    "/mode <diagnosis|tuning>",
    "/lang <pl|en|de>",
    "/vehicle <car|motorcycle|truck|other>",
    "/engine <petrol|diesel|lpg|hybrid|electric>",
    "/image <path>",
    "/noimage",
    "/show",
    "/history",
    "/transcript",
    "/help",
    "/quit",
];
