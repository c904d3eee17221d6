use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use procura_core::config::{resolve_config_path, AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

use crate::commands::CommandResult;

struct ConfigSource {
    path: Option<PathBuf>,
    doc: Option<Value>,
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                2,
            );
        }
    };

    let path = resolve_config_path(None);
    let source = ConfigSource { doc: load_config_file_doc(path.as_deref()), path };

    CommandResult { exit_code: 0, output: render(&config, &source) }
}

fn render(config: &AppConfig, source: &ConfigSource) -> String {
    let api_key = config
        .llm
        .api_key
        .as_ref()
        .map(|key| redact_token(key.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());

    let fields: [(&str, String, &[&str]); 15] = [
        ("llm.provider", format!("{:?}", config.llm.provider), &["PROCURA_LLM_PROVIDER"]),
        ("llm.base_url", config.llm.base_url.clone(), &["PROCURA_LLM_BASE_URL"]),
        ("llm.model", config.llm.model.clone(), &["PROCURA_LLM_MODEL"]),
        ("llm.api_key", api_key, &["PROCURA_LLM_API_KEY", "OPENAI_API_KEY"]),
        ("llm.temperature", config.llm.temperature.to_string(), &["PROCURA_LLM_TEMPERATURE"]),
        ("llm.timeout_secs", config.llm.timeout_secs.to_string(), &["PROCURA_LLM_TIMEOUT_SECS"]),
        ("llm.max_retries", config.llm.max_retries.to_string(), &["PROCURA_LLM_MAX_RETRIES"]),
        ("agent.company_name", config.agent.company_name.clone(), &["PROCURA_AGENT_COMPANY_NAME"]),
        ("agent.max_steps", config.agent.max_steps.to_string(), &["PROCURA_AGENT_MAX_STEPS"]),
        (
            "agent.max_query_chars",
            config.agent.max_query_chars.to_string(),
            &["PROCURA_AGENT_MAX_QUERY_CHARS"],
        ),
        (
            "server.bind_address",
            config.server.bind_address.clone(),
            &["PROCURA_SERVER_BIND_ADDRESS"],
        ),
        ("server.port", config.server.port.to_string(), &["PROCURA_SERVER_PORT", "PORT"]),
        (
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            &["PROCURA_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        ),
        (
            "logging.level",
            config.logging.level.clone(),
            &["PROCURA_LOGGING_LEVEL", "PROCURA_LOG_LEVEL"],
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format),
            &["PROCURA_LOGGING_FORMAT", "PROCURA_LOG_FORMAT"],
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(fields.iter().map(|(key, value, env_keys)| {
        render_line(key, value, field_source(key, env_keys, source))
    }));
    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(key_path: &str, env_keys: &[&str], source: &ConfigSource) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = &source.doc {
        if contains_path(doc, key_path) {
            let file_path = source
                .path
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}

#[cfg(test)]
mod tests {
    use super::{contains_path, redact_token};

    #[test]
    fn redaction_keeps_only_the_key_prefix() {
        assert_eq!(redact_token("sk-proj-abcdef"), "sk-***");
        assert_eq!(redact_token("plainsecret"), "<redacted>");
        assert_eq!(redact_token("  "), "<empty>");
    }

    #[test]
    fn dotted_paths_resolve_in_toml_documents() {
        let doc: toml::Value = "[llm]\nmodel = \"llama3.1\"\n".parse().expect("toml");

        assert!(contains_path(&doc, "llm.model"));
        assert!(!contains_path(&doc, "llm.base_url"));
        assert!(!contains_path(&doc, "server.port"));
    }
}
