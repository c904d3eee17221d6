use std::sync::Arc;

use procura_agent::AgentRuntime;
use procura_core::config::{AppConfig, ConfigError};
use procura_core::{Catalogs, SessionRegistry};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub catalogs: Arc<Catalogs>,
    pub sessions: Arc<SessionRegistry>,
    pub agent_runtime: Arc<AgentRuntime>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("agent runtime initialization failed: {0}")]
    AgentRuntime(String),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        thread_id = "unknown",
        "starting application bootstrap"
    );

    let catalogs = Catalogs::seeded();
    info!(
        event_name = "system.bootstrap.catalogs_loaded",
        correlation_id = "bootstrap",
        products = catalogs.products.len(),
        suppliers = catalogs.suppliers.len(),
        companies = catalogs.companies.len(),
        "reference catalogs loaded"
    );

    let agent_runtime = AgentRuntime::from_config(&config, &catalogs)
        .map_err(|error| BootstrapError::AgentRuntime(format!("{error:#}")))?;
    info!(
        event_name = "system.bootstrap.agent_ready",
        correlation_id = "bootstrap",
        model = %config.llm.model,
        base_url = %config.llm.base_url,
        "agent runtime initialized"
    );

    Ok(Application {
        config,
        catalogs: Arc::new(catalogs),
        sessions: Arc::new(SessionRegistry::new()),
        agent_runtime: Arc::new(agent_runtime),
    })
}

#[cfg(test)]
mod tests {
    use procura_core::config::{AppConfig, ConfigOverrides, LoadOptions};

    use crate::bootstrap::{bootstrap_with_config, BootstrapError};

    #[test]
    fn config_errors_surface_as_bootstrap_errors() {
        let error = AppConfig::load(LoadOptions {
            config_path: Some("does-not-exist/procura.toml".into()),
            overrides: ConfigOverrides { agent_max_steps: Some(0), ..ConfigOverrides::default() },
            ..LoadOptions::default()
        })
        .map_err(BootstrapError::from)
        .err()
        .map(|error| error.to_string())
        .unwrap_or_default();

        assert!(error.contains("agent.max_steps"));
    }

    #[test]
    fn bootstrap_wires_catalogs_sessions_and_runtime() {
        let app = bootstrap_with_config(AppConfig::default()).expect("bootstrap with defaults");

        assert_eq!(app.catalogs.products.len(), 2);
        assert!(app.sessions.is_empty());
        assert_eq!(app.agent_runtime.settings().max_steps, app.config.agent.max_steps);
        assert!(app.agent_runtime.tool_definitions().iter().any(|tool| tool.name == "task"));
    }
}
