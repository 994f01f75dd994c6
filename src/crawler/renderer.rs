//! Headless Chromium rendering for script-populated detail pages
//!
//! One browser and one reused tab serve every rendered fetch of a crawl. A
//! page counts as rendered once navigation finished and the network stayed
//! quiet (at most `max-inflight-requests` open) for `network-idle-ms`.

use crate::config::RendererConfig;
use crate::{FetchError, FundingError};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
};
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::stream::{self, Stream, StreamExt};
use std::collections::HashSet;
use std::time::Duration;
use tokio::task::JoinHandle;

/// A network event relevant to idle detection
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NetworkActivity {
    Started(String),
    Done(String),
}

/// Live browser session
pub struct Renderer {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Page,
    idle_window: Duration,
    max_inflight: usize,
    navigation_timeout: Duration,
}

impl Renderer {
    /// Launches the browser and opens the tab used for every render
    ///
    /// # Returns
    ///
    /// * `Ok(Renderer)` - Browser is running
    /// * `Err(FundingError)` - Chromium could not be found or started
    pub async fn launch(config: &RendererConfig) -> Result<Self, FundingError> {
        let mut builder = BrowserConfig::builder()
            .request_timeout(Duration::from_secs(config.navigation_timeout_secs));
        if !config.headless {
            builder = builder.with_head();
        }
        if config.no_sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(path) = &config.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        let browser_config = builder.build().map_err(FundingError::Browser)?;

        let (mut browser, mut events) = Browser::launch(browser_config).await?;
        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(e) = event {
                    tracing::trace!("Browser handler event error: {}", e);
                }
            }
        });

        let page = match open_tab(&browser).await {
            Ok(page) => page,
            Err(e) => {
                close_browser(&mut browser, handler).await;
                return Err(e.into());
            }
        };

        tracing::info!(
            "Browser launched (headless: {}, idle window: {}ms)",
            config.headless,
            config.network_idle_ms
        );

        Ok(Self {
            browser,
            handler,
            page,
            idle_window: Duration::from_millis(config.network_idle_ms),
            max_inflight: config.max_inflight_requests,
            navigation_timeout: Duration::from_secs(config.navigation_timeout_secs),
        })
    }

    /// Navigates to `url`, waits for network idle and returns the DOM
    pub async fn render(&self, url: &str) -> Result<String, FetchError> {
        let render_error = |e: CdpError| FetchError::Render {
            url: url.to_string(),
            message: e.to_string(),
        };

        let started = self
            .page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .map_err(render_error)?
            .map(|event| NetworkActivity::Started(event.request_id.inner().clone()));
        let finished = self
            .page
            .event_listener::<EventLoadingFinished>()
            .await
            .map_err(render_error)?
            .map(|event| NetworkActivity::Done(event.request_id.inner().clone()));
        let failed = self
            .page
            .event_listener::<EventLoadingFailed>()
            .await
            .map_err(render_error)?
            .map(|event| NetworkActivity::Done(event.request_id.inner().clone()));
        let mut activity = stream::select(started, stream::select(finished, failed));

        let navigation = async {
            self.page.goto(url).await.map_err(render_error)?;
            wait_for_network_idle(&mut activity, self.idle_window, self.max_inflight).await;
            Ok::<(), FetchError>(())
        };
        tokio::time::timeout(self.navigation_timeout, navigation)
            .await
            .map_err(|_| FetchError::Timeout {
                url: url.to_string(),
            })??;

        let html = self.page.content().await.map_err(render_error)?;
        tracing::info!("Rendered URL: {}", url);
        Ok(html)
    }

    /// Closes the browser and waits for its process and handler to exit
    pub async fn close(mut self) {
        close_browser(&mut self.browser, self.handler).await;
        tracing::info!("Browser closed");
    }
}

async fn open_tab(browser: &Browser) -> Result<Page, CdpError> {
    let page = browser.new_page("about:blank").await?;
    page.execute(EnableParams::default()).await?;
    Ok(page)
}

async fn close_browser(browser: &mut Browser, handler: JoinHandle<()>) {
    if let Err(e) = browser.close().await {
        tracing::warn!("Failed to close browser: {}", e);
    }
    if let Err(e) = browser.wait().await {
        tracing::warn!("Failed to wait for browser process: {}", e);
    }
    handler.abort();
    let _ = handler.await;
}

/// Waits until the number of open requests stayed at or below `max_inflight`
/// for a full `quiet_for` window
///
/// Returns early if the activity stream ends.
pub(crate) async fn wait_for_network_idle<S>(
    activity: &mut S,
    quiet_for: Duration,
    max_inflight: usize,
) where
    S: Stream<Item = NetworkActivity> + Unpin,
{
    let mut inflight: HashSet<String> = HashSet::new();
    loop {
        tokio::select! {
            event = activity.next() => match event {
                Some(NetworkActivity::Started(id)) => {
                    inflight.insert(id);
                }
                Some(NetworkActivity::Done(id)) => {
                    inflight.remove(&id);
                }
                None => return,
            },
            _ = tokio::time::sleep(quiet_for), if inflight.len() <= max_inflight => return,
        }
    }
}
