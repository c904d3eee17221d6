use std::collections::HashSet;
use std::time::Duration;

use procura_core::catalog::CatalogEntity;
use procura_core::config::{AppConfig, LlmProvider, LoadOptions};
use procura_core::{Catalog, Catalogs};
use secrecy::ExposeSecret;
use serde::Serialize;

use crate::commands::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool, probe: bool) -> CommandResult {
    let report = build_report(probe);
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 3 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report(probe: bool) -> DoctorReport {
    let mut checks = vec![check_catalogs(&Catalogs::seeded())];

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_llm_credentials(&config));
            checks.push(if probe {
                probe_llm_endpoint(&config)
            } else {
                DoctorCheck {
                    name: "llm_endpoint",
                    status: CheckStatus::Skipped,
                    details: "pass --probe to call the endpoint".to_string(),
                }
            });
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["llm_credentials", "llm_endpoint"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status != CheckStatus::Fail);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_catalogs(catalogs: &Catalogs) -> DoctorCheck {
    let problems: Vec<String> = [
        catalog_problem(&catalogs.products),
        catalog_problem(&catalogs.suppliers),
        catalog_problem(&catalogs.companies),
    ]
    .into_iter()
    .flatten()
    .collect();

    if problems.is_empty() {
        DoctorCheck {
            name: "catalog_integrity",
            status: CheckStatus::Pass,
            details: format!(
                "{} products, {} suppliers, {} companies with unique ids",
                catalogs.products.len(),
                catalogs.suppliers.len(),
                catalogs.companies.len()
            ),
        }
    } else {
        DoctorCheck { name: "catalog_integrity", status: CheckStatus::Fail, details: problems.join("; ") }
    }
}

fn catalog_problem<T: CatalogEntity>(catalog: &Catalog<T>) -> Option<String> {
    if catalog.is_empty() {
        return Some(format!("{} catalog is empty", catalog.kind()));
    }
    let mut seen = HashSet::new();
    catalog
        .iter()
        .map(T::id)
        .find(|id| !seen.insert(*id))
        .map(|id| format!("duplicate {} id `{id}`", catalog.kind()))
}

fn check_llm_credentials(config: &AppConfig) -> DoctorCheck {
    let has_key = config
        .llm
        .api_key
        .as_ref()
        .is_some_and(|key| !key.expose_secret().trim().is_empty());

    let details = match (config.llm.provider, has_key) {
        (LlmProvider::OpenAi, _) => "api key present for openai provider".to_string(),
        (LlmProvider::Ollama, true) => "ollama provider; api key will be sent as bearer token".to_string(),
        (LlmProvider::Ollama, false) => "ollama provider; no api key required".to_string(),
    };
    DoctorCheck { name: "llm_credentials", status: CheckStatus::Pass, details }
}

fn probe_llm_endpoint(config: &AppConfig) -> DoctorCheck {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "llm_endpoint",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let url = format!("{}/models", config.llm.base_url.trim_end_matches('/'));
    let result = runtime.block_on(async {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.llm.timeout_secs.min(10)))
            .build()
            .map_err(|error| format!("failed to build http client: {error}"))?;

        let mut request = client.get(&url);
        if let Some(key) = &config.llm.api_key {
            request = request.bearer_auth(key.expose_secret());
        }
        let response =
            request.send().await.map_err(|error| format!("request to `{url}` failed: {error}"))?;

        let status = response.status();
        if status.is_success() {
            Ok(status)
        } else {
            Err(format!("`{url}` answered {status}"))
        }
    });

    match result {
        Ok(status) => DoctorCheck {
            name: "llm_endpoint",
            status: CheckStatus::Pass,
            details: format!("`{url}` answered {status}"),
        },
        Err(error) => DoctorCheck { name: "llm_endpoint", status: CheckStatus::Fail, details: error },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
