//! Downloading external script bodies.

use crate::{wrap_script, Config, ExportError};
use async_trait::async_trait;
use futures::future::try_join_all;
use tracing::{debug, warn};
use url::Url;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScriptFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String, ExportError>;
}

/// Plain GET of each script URL.
///
/// Non-success statuses are not errors: the response body is kept, as a
/// browser `fetch` would return it.
#[derive(Debug, Clone)]
pub struct HttpScriptFetcher {
    client: reqwest::Client,
}

impl HttpScriptFetcher {
    pub fn new(config: &Config) -> Result<Self, ExportError> {
        let mut builder = reqwest::Client::builder();

        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        if let Some(timeout) = config.script_fetch_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl ScriptFetcher for HttpScriptFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, ExportError> {
        let parsed = Url::parse(url).map_err(|e| ExportError::script_fetch(url, e))?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| ExportError::script_fetch(url, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Script {} answered with HTTP {}", url, status);
        }

        let body = response.text().await?;
        debug!("Fetched {} ({} bytes)", url, body.len());
        Ok(body)
    }
}

/// Fetches every script at once and returns the wrapped bodies in the order of
/// `sources`, whatever order the downloads finish in. The first failure wins.
pub async fn fetch_scripts<F>(
    fetcher: &F,
    sources: &[String],
    website: &str,
) -> Result<Vec<String>, ExportError>
where
    F: ScriptFetcher + ?Sized,
{
    let downloads = sources.iter().map(|src| async move {
        let body = fetcher.fetch_text(src).await?;
        Ok::<_, ExportError>(wrap_script(src, website, &body))
    });

    try_join_all(downloads).await
}
