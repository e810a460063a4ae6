mod browser;
mod engine;
mod report;
mod wizard;

pub use browser::EokaPage;
pub use engine::{EntryIndex, FillEngine};
pub use report::{FieldOutcome, FieldReport, FillError, FillReport, FillStatus};
pub use wizard::{
    StepReport, TransitionOutcome, Wizard, WizardPhase, WizardReport, WizardState,
};

use crate::config::{AnswerMap, BrowserConfig, Config};
use crate::Result;
use eoka::{Browser, Page};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Result of running a config.
#[derive(Debug)]
pub struct RunResult {
    /// Whether every step filled and transitioned.
    pub success: bool,
    /// Error message if failed.
    pub error: Option<String>,
    /// Per-step details.
    pub report: WizardReport,
    /// Total duration in milliseconds.
    pub duration_ms: u64,
}

/// Fills site configs in a stealth browser.
pub struct Runner {
    browser: Browser,
    page: Page,
}

impl Runner {
    /// Create a new runner with browser config.
    pub async fn new(config: &BrowserConfig) -> Result<Self> {
        let stealth = eoka::StealthConfig {
            headless: config.headless,
            proxy: config.proxy.clone(),
            user_agent: config.user_agent.clone(),
            viewport_width: config.viewport.as_ref().map(|v| v.width).unwrap_or(1280),
            viewport_height: config.viewport.as_ref().map(|v| v.height).unwrap_or(720),
            ..Default::default()
        };

        debug!(
            "Launching browser (headless: {}, proxy: {:?})",
            config.headless, config.proxy
        );
        let browser = Browser::launch_with_config(stealth).await?;
        let page = browser.new_page("about:blank").await?;

        Ok(Self { browser, page })
    }

    /// Get a reference to the page.
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Navigate to the target and fill every step with config defaults
    /// overlaid by `answers`.
    ///
    /// Fill failures are reported in the result; `Err` means the browser
    /// itself failed.
    pub async fn run(&self, config: &Config, answers: &AnswerMap) -> Result<RunResult> {
        let start = Instant::now();
        let answers = config.answers(answers);

        info!("Navigating to: {}", config.target.url);
        self.page.goto(&config.target.url).await?;

        let page = EokaPage::new(&self.page);
        let report = Wizard::new(&page)
            .with_timeouts(config.timeouts.clone())
            .run_shared(&config.steps, &answers)
            .await;

        let error = report.error.as_ref().map(|e| e.to_string());
        if let Some(ref e) = error {
            warn!("Run failed: {}", e);
            self.handle_failure(config).await;
        }

        Ok(RunResult {
            success: report.is_success(),
            error,
            report,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn handle_failure(&self, config: &Config) {
        if let Some(ref on_failure) = config.on_failure {
            if let Some(ref screenshot_path) = on_failure.screenshot {
                let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S").to_string();
                let path = screenshot_path.replace("{timestamp}", &timestamp);
                info!("Saving failure screenshot to: {}", path);
                match self.page.screenshot().await {
                    Ok(data) => {
                        if let Err(e) = std::fs::write(&path, data) {
                            warn!("Failed to save screenshot: {}", e);
                        }
                    }
                    Err(e) => warn!("Failed to capture screenshot: {}", e),
                }
            }
        }
    }

    /// Close the browser.
    pub async fn close(self) -> Result<()> {
        self.browser.close().await?;
        Ok(())
    }
}
