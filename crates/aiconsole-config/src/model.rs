use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// System-prompt template used when none is configured. Tokens are
/// substituted per user at request time.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant integrated into the \
     marketing console. Hello {account_firstname}, I will help you with your marketing \
     automation tasks, email campaigns, and contact management. Please respond in {language}.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub console: ConsoleConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub speech: SpeechConfig,

    /// Per-tool enable flags, keyed by tool function name.
    #[serde(default = "default_tool_flags")]
    pub tools: HashMap<String, bool>,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub fingerprint: FingerprintConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            console: ConsoleConfig::default(),
            llm: LlmConfig::default(),
            speech: SpeechConfig::default(),
            tools: default_tool_flags(),
            database: DatabaseConfig::default(),
            fingerprint: FingerprintConfig::default(),
        }
    }
}

impl AppConfig {
    /// Whether the named tool is switched on. Unknown names are off.
    pub fn tool_enabled(&self, function_name: &str) -> bool {
        self.tools.get(function_name).copied().unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Master switch; when off the process endpoint answers 403.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Completion model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// System-prompt template with {language}, {account_firstname},
    /// {account_lastname}, {account_email}, {app_version} tokens.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Host application version substituted for {app_version}.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub app_version: Option<String>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: default_model(),
            system_prompt: default_system_prompt(),
            app_version: None,
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Default)]
pub struct LlmConfig {
    /// OpenAI-compatible endpoint base URL; None uses the client default.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub base_url: Option<String>,

    /// API key; the AICONSOLE_API_KEY environment variable takes precedence.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub api_key: Option<String>,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_speech_model")]
    pub model: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            model: default_speech_model(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DatabaseConfig {
    /// Path to the SQLite file; None resolves to the default data dir.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub path: Option<PathBuf>,
}

/// Inputs to the deployment fingerprint. Each field contributes only when
/// non-empty; the OS hostname is always included.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct FingerprintConfig {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub site_url: Option<String>,

    #[serde(default, deserialize_with = "empty_as_none")]
    pub db_host: Option<String>,

    #[serde(default, deserialize_with = "empty_as_none")]
    pub db_name: Option<String>,

    #[serde(default, deserialize_with = "empty_as_none")]
    pub secret_key: Option<String>,
}

impl std::fmt::Debug for FingerprintConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FingerprintConfig")
            .field("site_url", &self.site_url)
            .field("db_host", &self.db_host)
            .field("db_name", &self.db_name)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Empty strings in the file mean "unset", matching the host plugin's
/// convention of shipping every key with a blank default.
fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: From<String>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.is_empty()).map(T::from))
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8090
}

fn default_true() -> bool {
    true
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_speech_model() -> String {
    "whisper-1".to_string()
}

fn default_tool_flags() -> HashMap<String, bool> {
    HashMap::from([
        ("create_contact".to_string(), false),
        ("create_segment".to_string(), false),
        ("clear_cache".to_string(), true),
    ])
}
