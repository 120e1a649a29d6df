//! Remote image download.

use std::time::Duration;

use reqwest::StatusCode;
use tracing::{debug, error};

use crate::{PipelineError, RenderOutcome};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Downloads images over HTTP and decodes them in memory.
#[derive(Clone)]
pub struct ImageFetcher {
    http: reqwest::Client,
}

impl Default for ImageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageFetcher {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { http }
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// GET `url` and decode the body as an image.
    ///
    /// Any 2xx status or 304 counts as success. Every failure is logged here
    /// and returned as an error; nothing panics.
    pub async fn fetch(&self, url: &str) -> RenderOutcome {
        let resp = self.http.get(url).send().await.map_err(|e| {
            error!(url, "Image request failed: {e}");
            PipelineError::Http(e)
        })?;

        let status = resp.status();
        if !is_success(status) {
            error!(
                url,
                status = status.as_u16(),
                "Received non-success response for image"
            );
            return Err(PipelineError::FetchStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp.bytes().await.map_err(|e| {
            error!(url, "Failed to read image body: {e}");
            PipelineError::Http(e)
        })?;
        debug!(url, bytes = body.len(), "Downloaded image, decoding");

        image::load_from_memory(&body).map_err(|e| {
            error!(url, bytes = body.len(), "Failed to decode image: {e}");
            PipelineError::Decode(e)
        })
    }
}

fn is_success(status: StatusCode) -> bool {
    status.is_success() || status == StatusCode::NOT_MODIFIED
}
