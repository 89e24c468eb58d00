use std::time::Duration;

use async_trait::async_trait;
use thirtyfour::{
    CapabilitiesHelper, ChromiumLikeCapabilities, DesiredCapabilities, Proxy, WebDriver,
};

use crate::{configuration::WebDriverSettings, error::FatalError, error::FetchError};

use super::{Dom, PageLoader};

// A live WebDriver session; close it with `quit`
pub struct Droid {
    driver: WebDriver,
}

impl Droid {
    pub async fn connect(
        settings: &WebDriverSettings,
        page_load_timeout: Duration,
    ) -> Result<Self, FatalError> {
        let mut caps = DesiredCapabilities::chrome();
        if settings.headless {
            caps.set_headless()
                .map_err(|e| FatalError::Session(e.to_string()))?;
        }

        if let Some(proxy) = &settings.proxy {
            let proxy = Proxy::Manual {
                ftp_proxy: None,
                http_proxy: Some(proxy.clone()),
                ssl_proxy: Some(proxy.clone()),
                socks_proxy: None,
                socks_version: None,
                socks_username: None,
                socks_password: None,
                no_proxy: None,
            };
            caps.set_proxy(proxy)
                .map_err(|e| FatalError::Session(e.to_string()))?;
        }

        let driver = WebDriver::new(&settings.url, caps)
            .await
            .map_err(|e| FatalError::Session(format!("{}: {}", settings.url, e)))?;

        if let Err(e) = driver.set_page_load_timeout(page_load_timeout).await {
            log::warn!("Could not set page load timeout on driver: {:?}", e);
        }

        log::info!("Browser session established on {}", settings.url);
        Ok(Droid { driver })
    }

    pub async fn quit(self) {
        match self.driver.quit().await {
            Ok(_) => log::info!("Browser session closed"),
            Err(e) => log::error!("Failed to close browser session: {:?}", e),
        }
    }
}

#[async_trait]
impl PageLoader for Droid {
    async fn load_page(&self, url: &str) -> Result<Dom, FetchError> {
        let page_load = |e: thirtyfour::error::WebDriverError| FetchError::PageLoad {
            url: url.to_string(),
            reason: e.to_string(),
        };

        self.driver.goto(url).await.map_err(page_load)?;
        let html = self.driver.source().await.map_err(page_load)?;

        Ok(Dom {
            url: url.to_string(),
            html,
        })
    }
}
