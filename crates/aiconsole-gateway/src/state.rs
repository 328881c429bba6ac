use std::sync::Arc;

use aiconsole_agents::{
    CompletionClient, ConsoleOrchestrator, OrchestratorSettings, ToolRegistry, ToolServices,
};
use aiconsole_common::Result;
use aiconsole_config::AppConfig;
use aiconsole_db::ConversationStore;
use aiconsole_security::{FingerprintInputs, deployment_fingerprint};
use tokio::sync::Mutex;

/// Shared application state handed to every request handler.
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<Mutex<ConversationStore>>,
    pub client: CompletionClient,
    pub orchestrator: ConsoleOrchestrator,
    pub fingerprint: String,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Wires the completion client, tool registry and orchestrator from the
    /// loaded configuration. `services` carries whatever collaborator
    /// implementations the embedding host provides for the built-in tools;
    /// tools whose collaborator is absent report that at execution time.
    pub fn new(
        config: AppConfig,
        store: ConversationStore,
        services: ToolServices,
    ) -> Result<Self> {
        let fingerprint = deployment_fingerprint(&FingerprintInputs {
            site_url: config.fingerprint.site_url.clone(),
            db_host: config.fingerprint.db_host.clone(),
            db_name: config.fingerprint.db_name.clone(),
            secret_key: config.fingerprint.secret_key.clone(),
        });

        let registry = ToolRegistry::build(&config.tools, services)?;
        let client = CompletionClient::new(
            config.llm.api_key.clone().unwrap_or_default(),
            config.llm.base_url.clone(),
        );
        let store = Arc::new(Mutex::new(store));

        let orchestrator = ConsoleOrchestrator::new(
            Arc::clone(&store),
            registry,
            client.clone(),
            OrchestratorSettings {
                model: config.console.model.clone(),
                system_prompt: config.console.system_prompt.clone(),
                app_version: config.console.app_version.clone(),
                fingerprint: Some(fingerprint.clone()),
            },
        );

        Ok(Self {
            config,
            store,
            client,
            orchestrator,
            fingerprint,
        })
    }
}
