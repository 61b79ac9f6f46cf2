//! Response lookup: operator overrides first, then built-in replies

use crate::infrastructure::traits::BotRepository;

pub const DEFAULT_RESPONSE_KEY: &str = "default_response";

pub const DEFAULT_RESPONSE: &str =
    "I'm sorry, I didn't understand that. Type /help to see available commands.";

pub const UNKNOWN_COMMAND_RESPONSE: &str =
    "Command not recognized. Type /help for available commands.";

const FALLBACK_RESPONSES: [(&str, &str); 4] = [
    (
        "help",
        "Available commands:\n/help - Show this help message\n/info - Company information\n/contact - Contact details",
    ),
    (
        "info",
        "We are a leading company providing excellent services.",
    ),
    (
        "contact",
        "Contact us at support@company.com or +1 (555) 123-4567",
    ),
    (
        "order",
        "To check your order status, please provide your order number.",
    ),
];

pub fn config_key(command: &str) -> String {
    format!("{command}_message")
}

pub fn fallback_response(command: &str) -> Option<&'static str> {
    FALLBACK_RESPONSES
        .iter()
        .find(|(name, _)| *name == command)
        .map(|(_, response)| *response)
}

async fn configured(repo: &dyn BotRepository, key: &str) -> Option<String> {
    repo.get_bot_config(key)
        .await
        .filter(|config| config.is_active)
        .map(|config| config.value)
}

/// Reply to `/command`.
pub async fn resolve_command(repo: &dyn BotRepository, command: &str) -> String {
    match configured(repo, &config_key(command)).await {
        Some(value) => value,
        None => fallback_response(command)
            .unwrap_or(UNKNOWN_COMMAND_RESPONSE)
            .to_owned(),
    }
}

/// Reply to anything that is not a command.
pub async fn resolve_default(repo: &dyn BotRepository) -> String {
    configured(repo, DEFAULT_RESPONSE_KEY)
        .await
        .unwrap_or_else(|| DEFAULT_RESPONSE.to_owned())
}
