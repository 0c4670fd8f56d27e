//! Headless Chromium backend driven over the DevTools protocol.

use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::{
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::cdp::browser_protocol::network::{EnableParams, SetBlockedUrLsParams};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures_util::future::BoxFuture;
use futures_util::StreamExt;
use shotlist_logging::{scan_debug, scan_info, scan_warn};
use tokio::task::JoinHandle;

use crate::backend::{CaptureBackend, CaptureError, FailureKind};
use crate::tab::TabGuard;

/// Media that is never fetched while capturing.
pub const BLOCKED_MEDIA_PATTERNS: &[&str] = &[
    "*.mp4", "*.avi", "*.webm", "*.mov", "*.m3u8", "*.mp3", "*.wav", "*.ogg", "*.flac", "*.aac",
];

#[derive(Debug, Clone)]
pub struct CapturePolicy {
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Pause after load so late layout settles before the shot.
    pub settle_delay: Duration,
    pub blocked_url_patterns: Vec<String>,
    pub deny_downloads: bool,
    /// Timeout for individual DevTools commands.
    pub command_timeout: Duration,
    pub chrome_executable: Option<PathBuf>,
}

impl Default for CapturePolicy {
    fn default() -> Self {
        Self {
            viewport_width: 1280,
            viewport_height: 800,
            settle_delay: Duration::from_millis(1000),
            blocked_url_patterns: BLOCKED_MEDIA_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            deny_downloads: true,
            command_timeout: Duration::from_secs(30),
            chrome_executable: None,
        }
    }
}

/// One shared headless browser, launched lazily; every capture gets its own tab.
pub struct ChromiumBackend {
    policy: CapturePolicy,
    browser: tokio::sync::Mutex<Option<Browser>>,
    handler: Mutex<Option<JoinHandle<()>>>,
}

impl ChromiumBackend {
    pub fn new(policy: CapturePolicy) -> Self {
        Self {
            policy,
            browser: tokio::sync::Mutex::new(None),
            handler: Mutex::new(None),
        }
    }

    /// Open a blank tab, launching the browser on first use.
    async fn open_tab(&self) -> Result<Page, CaptureError> {
        let mut slot = self.browser.lock().await;
        if slot.is_none() {
            *slot = Some(self.launch().await?);
        }
        let Some(browser) = slot.as_ref() else {
            return Err(CaptureError::render("browser unavailable"));
        };
        browser
            .new_page("about:blank")
            .await
            .map_err(|err| CaptureError::render(format!("new tab: {err}")))
    }

    async fn launch(&self) -> Result<Browser, CaptureError> {
        scan_info!("Launching headless browser");
        let mut builder = BrowserConfig::builder()
            .window_size(self.policy.viewport_width, self.policy.viewport_height)
            .request_timeout(self.policy.command_timeout)
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--mute-audio")
            .arg("--autoplay-policy=user-gesture-required")
            .arg("--hide-scrollbars");
        if let Some(path) = &self.policy.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|err| CaptureError::render(format!("browser config: {err}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|err| CaptureError::render(format!("browser launch: {err}")))?;

        let task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    scan_debug!("Browser handler error: {}", err);
                }
            }
        });
        if let Ok(mut slot) = self.handler.lock() {
            *slot = Some(task);
        }

        if self.policy.deny_downloads {
            browser
                .execute(SetDownloadBehaviorParams::new(
                    SetDownloadBehaviorBehavior::Deny,
                ))
                .await
                .map_err(|err| CaptureError::render(format!("download policy: {err}")))?;
        }
        Ok(browser)
    }

    async fn shoot(&self, page: &Page, url: &str, quality: u8) -> Result<Vec<u8>, CaptureError> {
        page.execute(EnableParams::default())
            .await
            .map_err(navigation_error)?;
        if !self.policy.blocked_url_patterns.is_empty() {
            page.execute(SetBlockedUrLsParams::new(
                self.policy.blocked_url_patterns.clone(),
            ))
            .await
            .map_err(navigation_error)?;
        }

        page.goto(url).await.map_err(navigation_error)?;
        page.wait_for_navigation()
            .await
            .map_err(navigation_error)?;
        tokio::time::sleep(self.policy.settle_delay).await;

        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Jpeg)
            .quality(i64::from(quality))
            .full_page(false)
            .build();
        page.screenshot(params)
            .await
            .map_err(|err| CaptureError::render(err.to_string()))
    }
}

#[async_trait::async_trait]
impl CaptureBackend for ChromiumBackend {
    async fn open_page(
        &self,
        url: &str,
        quality: u8,
        timeout: Duration,
    ) -> Result<Vec<u8>, CaptureError> {
        let page = self.open_tab().await?;
        let tab = TabGuard::new(page.clone(), close_page);

        let result = match tokio::time::timeout(timeout, self.shoot(&page, url, quality)).await {
            Ok(result) => result,
            Err(_) => Err(CaptureError::timeout(timeout)),
        };
        tab.close().await;
        match result {
            Err(err) if err.kind == FailureKind::Timeout => Err(CaptureError::timeout(timeout)),
            other => other,
        }
    }

    async fn shutdown(&self) {
        if let Some(mut browser) = self.browser.lock().await.take() {
            if let Err(err) = browser.close().await {
                scan_warn!("Failed to close browser: {}", err);
            }
            if let Err(err) = browser.wait().await {
                scan_debug!("Browser process wait failed: {}", err);
            }
            scan_info!("Browser shut down");
        }
        let task = self.handler.lock().ok().and_then(|mut slot| slot.take());
        if let Some(task) = task {
            task.abort();
        }
    }
}

fn close_page(page: Page) -> BoxFuture<'static, ()> {
    Box::pin(async move {
        if let Err(err) = page.close().await {
            scan_warn!("Failed to close tab: {}", err);
        }
    })
}

fn navigation_error(err: CdpError) -> CaptureError {
    match err {
        CdpError::Timeout => CaptureError::new(FailureKind::Timeout, "navigation timed out"),
        other => CaptureError::navigation(other.to_string()),
    }
}
