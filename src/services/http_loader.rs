use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::{configuration::FetchSettings, error::FetchError};

use super::{Dom, PageLoader};

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko)";

pub struct HttpLoader {
    client: Client,
}

impl HttpLoader {
    pub fn new(settings: &FetchSettings) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(
                settings
                    .user_agent
                    .clone()
                    .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            )
            .cookie_store(true)
            .read_timeout(settings.page_load_timeout())
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(HttpLoader { client })
    }
}

#[async_trait]
impl PageLoader for HttpLoader {
    async fn load_page(&self, url: &str) -> Result<Dom, FetchError> {
        let page_load = |reason: String| FetchError::PageLoad {
            url: url.to_string(),
            reason,
        };

        let res = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| page_load(e.to_string()))?;

        if !res.status().is_success() {
            return Err(page_load(format!("status {}", res.status())));
        }

        let html = res.text().await.map_err(|e| page_load(e.to_string()))?;

        Ok(Dom {
            url: url.to_string(),
            html,
        })
    }
}
