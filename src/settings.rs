use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

const CONFIG_FILE: &str = "site_classifier";
const ENV_PREFIX: &str = "CLASSIFY";

/// Runtime settings: defaults, then `site_classifier.toml`, then `CLASSIFY_*` env.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub model_timeout_secs: u64,
    pub browser_fallback: bool,
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            model_timeout_secs: 120,
            browser_fallback: true,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
                .to_string(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        // .env is optional
        let _ = dotenvy::dotenv();

        let settings = Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .context("Failed to load settings")?;

        let mut settings: Settings = settings
            .try_deserialize()
            .context("Invalid settings")?;
        if settings.openai_api_key.is_none() {
            settings.openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        }
        Ok(settings)
    }

    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert!(s.browser_fallback);
        assert_eq!(s.model_timeout(), Duration::from_secs(120));
        assert!(s.user_agent.starts_with("Mozilla/5.0"));
        assert!(s.openai_api_key.is_none());
    }

    #[test]
    fn partial_source_keeps_defaults() {
        let s: Settings = Config::builder()
            .set_override("browser_fallback", false)
            .unwrap()
            .set_override("model_timeout_secs", 30)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert!(!s.browser_fallback);
        assert_eq!(s.model_timeout_secs, 30);
        assert_eq!(s.openai_base_url, "https://api.openai.com/v1");
    }
}
