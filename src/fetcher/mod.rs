//! Content acquisition for one URL.
//!
//! Tiers are tried in order. A tier that errors counts as empty. Every tier
//! but the last must clear the minimum-content bar to be accepted; the last
//! tier's text is accepted whenever it is non-empty.

pub mod browser;
pub mod http;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::extract;
use crate::settings::Settings;

pub use browser::BrowserFetch;
pub use http::HttpFetch;

/// Trimmed characters below which the next tier is tried.
pub const MIN_CONTENT_CHARS: usize = 200;

/// One way of getting raw markup for a URL.
#[async_trait]
pub trait FetchStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_markup(&self, url: &str) -> Result<String>;
}

/// Extracted text plus the tier that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub text: String,
    pub tier: &'static str,
}

pub struct ContentFetcher {
    tiers: Vec<Box<dyn FetchStrategy>>,
    min_chars: usize,
}

impl ContentFetcher {
    pub fn new(tiers: Vec<Box<dyn FetchStrategy>>) -> Self {
        Self {
            tiers,
            min_chars: MIN_CONTENT_CHARS,
        }
    }

    /// HTTP first, then the headless browser unless disabled.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut tiers: Vec<Box<dyn FetchStrategy>> =
            vec![Box::new(HttpFetch::new(&settings.user_agent)?)];
        if settings.browser_fallback {
            tiers.push(Box::new(BrowserFetch::new()));
        } else {
            info!("Headless browser fallback disabled");
        }
        Ok(Self::new(tiers))
    }

    /// Run the chain. `None` means no tier produced usable text.
    pub async fn fetch(&self, url: &str) -> Option<Fetched> {
        let last = self.tiers.len().checked_sub(1)?;

        for (i, tier) in self.tiers.iter().enumerate() {
            let text = match tier.fetch_markup(url).await {
                Ok(markup) => extract::extract(&markup),
                Err(e) => {
                    warn!(url = %url, tier = tier.name(), error = %e, "fetch tier failed");
                    String::new()
                }
            };

            if i == last {
                return (!text.is_empty()).then_some(Fetched {
                    text,
                    tier: tier.name(),
                });
            }
            if has_enough_content(&text, self.min_chars) {
                return Some(Fetched {
                    text,
                    tier: tier.name(),
                });
            }
            debug!(
                url = %url,
                tier = tier.name(),
                chars = text.trim().chars().count(),
                "not enough content, escalating"
            );
        }

        None
    }
}

fn has_enough_content(text: &str, min_chars: usize) -> bool {
    !text.is_empty() && text.trim().chars().count() >= min_chars
}
