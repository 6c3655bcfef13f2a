use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions};
use tracing::debug;

use super::FetchStrategy;

const NAVIGATE_TIMEOUT: Duration = Duration::from_secs(20);
/// Unconditional wait after navigation so client-side rendering can finish.
const SETTLE_DELAY: Duration = Duration::from_secs(3);

/// Renders the page in a fresh headless Chrome per call.
pub struct BrowserFetch {
    navigate_timeout: Duration,
    settle: Duration,
}

impl BrowserFetch {
    pub fn new() -> Self {
        Self {
            navigate_timeout: NAVIGATE_TIMEOUT,
            settle: SETTLE_DELAY,
        }
    }
}

impl Default for BrowserFetch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FetchStrategy for BrowserFetch {
    fn name(&self) -> &'static str {
        "browser"
    }

    async fn fetch_markup(&self, url: &str) -> Result<String> {
        let url = url.to_string();
        let (navigate_timeout, settle) = (self.navigate_timeout, self.settle);
        tokio::task::spawn_blocking(move || render(&url, navigate_timeout, settle))
            .await
            .context("browser worker panicked")?
    }
}

/// Launch, navigate, settle, capture. The session is torn down on every exit path.
fn render(url: &str, navigate_timeout: Duration, settle: Duration) -> Result<String> {
    let session = BrowserSession::launch(navigate_timeout + settle)?;
    let tab = session.browser.new_tab().context("Failed to open tab")?;
    tab.set_default_timeout(navigate_timeout);
    tab.navigate_to(url)
        .and_then(|tab| tab.wait_until_navigated())
        .with_context(|| format!("Navigation to {} failed", url))?;

    std::thread::sleep(settle);

    tab.get_content().context("Failed to capture rendered document")
}

/// Owns one Chrome process for the duration of a single URL.
struct BrowserSession {
    browser: Browser,
}

impl BrowserSession {
    fn launch(busy_for: Duration) -> Result<Self> {
        let options = LaunchOptions::default_builder()
            .headless(true)
            .idle_browser_timeout(busy_for + Duration::from_secs(10))
            .build()
            .map_err(|e| anyhow!("Invalid browser launch options: {}", e))?;
        let browser = Browser::new(options).context("Failed to launch headless browser")?;
        debug!("headless browser launched");
        Ok(Self { browser })
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        // Browser's own Drop kills the Chrome process
        debug!("headless browser torn down");
    }
}
