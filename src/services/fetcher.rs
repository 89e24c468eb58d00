use std::time::Duration;

use async_trait::async_trait;

use crate::{configuration::FetchSettings, error::FetchError};

#[derive(Debug, Clone)]
pub struct Dom {
    pub url: String,
    pub html: String,
}

#[async_trait]
pub trait PageLoader: Send + Sync {
    async fn load_page(&self, url: &str) -> Result<Dom, FetchError>;
}

// Wraps a loader with a per-page timeout and bounded retries.
pub struct Fetcher<'a> {
    loader: &'a dyn PageLoader,
    timeout: Duration,
    max_attempts: u8,
    backoff: Duration,
}

impl<'a> Fetcher<'a> {
    pub fn new(loader: &'a dyn PageLoader, settings: &FetchSettings) -> Self {
        Fetcher {
            loader,
            timeout: settings.page_load_timeout(),
            max_attempts: settings.max_attempts.max(1),
            backoff: settings.backoff(),
        }
    }

    pub async fn fetch(&self, url: &str) -> Result<Dom, FetchError> {
        let mut attempt = 0;

        loop {
            attempt += 1;

            let result = match tokio::time::timeout(self.timeout, self.loader.load_page(url)).await
            {
                Ok(result) => result,
                Err(_) => Err(FetchError::Timeout {
                    url: url.to_string(),
                    secs: self.timeout.as_secs(),
                }),
            };

            match result {
                Ok(dom) => return Ok(dom),
                Err(e) if attempt >= self.max_attempts => return Err(e),
                Err(e) => {
                    log::warn!(
                        "Attempt {}/{} failed: {}. Retrying",
                        attempt,
                        self.max_attempts,
                        e
                    );
                    tokio::time::sleep(self.backoff * u32::from(attempt)).await;
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{
        collections::HashMap,
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use async_trait::async_trait;

    use super::{Dom, Fetcher, PageLoader};
    use crate::{configuration::FetchSettings, error::FetchError};

    // Serves canned pages; unknown urls fail to load.
    pub(crate) struct FakeLoader {
        pub pages: HashMap<String, String>,
        pub failures_before_success: usize,
        pub calls: AtomicUsize,
    }

    impl FakeLoader {
        pub fn new(pages: &[(&str, &str)]) -> Self {
            FakeLoader {
                pages: pages
                    .iter()
                    .map(|(url, html)| (url.to_string(), html.to_string()))
                    .collect(),
                failures_before_success: 0,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PageLoader for FakeLoader {
        async fn load_page(&self, url: &str) -> Result<Dom, FetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures_before_success {
                return Err(FetchError::PageLoad {
                    url: url.to_string(),
                    reason: "connection reset".to_string(),
                });
            }

            match self.pages.get(url) {
                Some(html) => Ok(Dom {
                    url: url.to_string(),
                    html: html.clone(),
                }),
                None => Err(FetchError::PageLoad {
                    url: url.to_string(),
                    reason: "404".to_string(),
                }),
            }
        }
    }

    struct StalledLoader;

    #[async_trait]
    impl PageLoader for StalledLoader {
        async fn load_page(&self, _url: &str) -> Result<Dom, FetchError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            unreachable!()
        }
    }

    pub(crate) fn quick_settings() -> FetchSettings {
        FetchSettings {
            page_load_timeout_secs: 1,
            max_attempts: 3,
            backoff_millis: 1,
            user_agent: None,
        }
    }

    #[tokio::test]
    async fn fetch_retries_until_success() {
        let mut loader = FakeLoader::new(&[("https://x/list", "<html></html>")]);
        loader.failures_before_success = 2;

        let settings = quick_settings();
        let dom = Fetcher::new(&loader, &settings)
            .fetch("https://x/list")
            .await
            .unwrap();

        assert_eq!(dom.html, "<html></html>");
        assert_eq!(loader.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn fetch_gives_up_after_max_attempts() {
        let loader = FakeLoader::new(&[]);

        let settings = quick_settings();
        let result = Fetcher::new(&loader, &settings).fetch("https://x/missing").await;

        assert!(matches!(result, Err(FetchError::PageLoad { .. })));
        assert_eq!(loader.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_times_out_stalled_pages() {
        let mut settings = quick_settings();
        settings.max_attempts = 1;

        let result = Fetcher::new(&StalledLoader, &settings)
            .fetch("https://x/slow")
            .await;

        assert!(matches!(result, Err(FetchError::Timeout { secs: 1, .. })));
    }
}
