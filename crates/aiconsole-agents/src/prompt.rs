use aiconsole_common::UserContext;
use aiconsole_db::ConversationEntry;

use crate::client::ChatMessage;

/// Language name substituted for the `{language}` token when the locale is
/// missing or unknown.
const FALLBACK_LANGUAGE: &str = "English";

/// Map a locale such as `pt_BR` to the language name the model is asked to
/// answer in. Unknown full locales fall back to their base subtag.
pub fn language_from_locale(locale: Option<&str>) -> &'static str {
    let Some(locale) = locale.filter(|locale| !locale.is_empty()) else {
        return FALLBACK_LANGUAGE;
    };
    if let Some(language) = language_for(locale) {
        return language;
    }
    locale
        .split('_')
        .next()
        .and_then(language_for)
        .unwrap_or(FALLBACK_LANGUAGE)
}

fn language_for(locale: &str) -> Option<&'static str> {
    let language = match locale {
        "en" | "en_US" | "en_GB" => "English",
        "fr" | "fr_FR" => "French",
        "de" | "de_DE" => "German",
        "es" | "es_ES" => "Spanish",
        "it" | "it_IT" => "Italian",
        "pt" | "pt_BR" | "pt_PT" => "Portuguese",
        "nl" | "nl_NL" => "Dutch",
        "ru" | "ru_RU" => "Russian",
        "ja" | "ja_JP" => "Japanese",
        "zh" | "zh_CN" | "zh_TW" => "Chinese",
        "ko" | "ko_KR" => "Korean",
        "ar" | "ar_SA" => "Arabic",
        "pl" | "pl_PL" => "Polish",
        "sv" | "sv_SE" => "Swedish",
        "da" | "da_DK" => "Danish",
        "no" | "no_NO" => "Norwegian",
        "fi" | "fi_FI" => "Finnish",
        _ => return None,
    };
    Some(language)
}

/// Substitute the per-user and per-deployment tokens into the system-prompt
/// template. Anything that is not a recognized token is left verbatim.
pub fn build_system_prompt(
    template: &str,
    user: &UserContext,
    app_version: Option<&str>,
) -> String {
    template
        .replace("{language}", language_from_locale(user.locale.as_deref()))
        .replace(
            "{account_firstname}",
            user.first_name.as_deref().unwrap_or("User"),
        )
        .replace(
            "{account_lastname}",
            user.last_name.as_deref().unwrap_or(""),
        )
        .replace("{account_email}", user.email.as_deref().unwrap_or(""))
        .replace("{app_version}", app_version.unwrap_or("Unknown"))
}

/// Assemble the completion request messages: the system prompt, one
/// user/assistant pair per prior turn (oldest first), then the current input.
pub fn build_messages(
    system_prompt: &str,
    history: &[ConversationEntry],
    input: &str,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() * 2 + 2);
    messages.push(ChatMessage::System {
        content: system_prompt.to_string(),
    });

    for entry in history {
        let Some(output) = &entry.output else {
            continue;
        };
        messages.push(ChatMessage::User {
            content: entry.prompt.clone(),
        });
        messages.push(ChatMessage::Assistant {
            content: output.clone(),
        });
    }

    messages.push(ChatMessage::User {
        content: input.to_string(),
    });
    messages
}
