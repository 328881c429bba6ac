use serde::{Deserialize, Serialize};

/// Identity of the user behind a console request, as forwarded by the
/// fronting host application. Every field is optional; an empty context is
/// an anonymous session and conversation entries are scoped accordingly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub locale: Option<String>,
}

impl UserContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Base language subtag of the user's locale ("en_US" -> "en"), used as
    /// the transcription language hint.
    pub fn language_code(&self) -> Option<&str> {
        self.locale
            .as_deref()
            .and_then(|locale| locale.split('_').next())
            .filter(|code| !code.is_empty())
    }
}
