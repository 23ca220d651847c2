use std::{fs, path::Path};

use anyhow::{anyhow, Context};
use client_core::{table::DEFAULT_PAGE_SIZE, SubmitFailurePolicy, WorkflowOptions};
use serde::Deserialize;
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_base_url: Url,
    pub page_size: usize,
    pub submit_failure: SubmitFailurePolicy,
}

impl Settings {
    pub fn defaults() -> anyhow::Result<Self> {
        Ok(Self {
            api_base_url: parse_api_base_url(DEFAULT_API_BASE_URL)?,
            page_size: DEFAULT_PAGE_SIZE,
            submit_failure: SubmitFailurePolicy::default(),
        })
    }

    /// Applies a `--api-base-url` flag, which wins over file and environment.
    pub fn with_api_base_url(mut self, flag: Option<&str>) -> anyhow::Result<Self> {
        if let Some(raw) = flag {
            self.api_base_url = parse_api_base_url(raw)?;
        }
        Ok(self)
    }

    pub fn workflow_options(&self) -> WorkflowOptions {
        WorkflowOptions {
            page_size: self.page_size,
            submit_failure: self.submit_failure,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    page_size: Option<usize>,
    submit_failure_policy: Option<String>,
}

/// Defaults, then `config_path` if it exists, then environment variables.
pub fn load_settings(config_path: &Path) -> anyhow::Result<Settings> {
    let mut settings = Settings::defaults()?;

    match fs::read_to_string(config_path) {
        Ok(raw) => {
            let file_cfg: FileSettings = toml::from_str(&raw)
                .with_context(|| format!("invalid config file '{}'", config_path.display()))?;
            apply_file(&mut settings, file_cfg)?;
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", config_path.display()))
        }
    }

    apply_env(&mut settings, |name| std::env::var(name).ok())?;
    Ok(settings)
}

fn apply_file(settings: &mut Settings, file_cfg: FileSettings) -> anyhow::Result<()> {
    if let Some(v) = file_cfg.api_base_url {
        settings.api_base_url = parse_api_base_url(&v)?;
    }
    if let Some(v) = file_cfg.page_size {
        settings.page_size = v.max(1);
    }
    if let Some(v) = file_cfg.submit_failure_policy {
        settings.submit_failure = v.parse::<SubmitFailurePolicy>().map_err(|err| anyhow!(err))?;
    }
    Ok(())
}

fn apply_env(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    if let Some(v) = lookup("REGISTRAR_API_BASE_URL") {
        settings.api_base_url = parse_api_base_url(&v)?;
    }
    if let Some(v) = lookup("APP__API_BASE_URL") {
        settings.api_base_url = parse_api_base_url(&v)?;
    }

    if let Some(v) = lookup("APP__PAGE_SIZE") {
        if let Ok(parsed) = v.trim().parse::<usize>() {
            settings.page_size = parsed.max(1);
        }
    }

    if let Some(v) = lookup("APP__SUBMIT_FAILURE_POLICY") {
        settings.submit_failure = v.parse::<SubmitFailurePolicy>().map_err(|err| anyhow!(err))?;
    }
    Ok(())
}

pub fn parse_api_base_url(raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("invalid api base url '{raw}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(anyhow!(
            "api base url '{raw}' must use http or https, not {}",
            url.scheme()
        ));
    }
    Ok(url)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
