use crate::error::QrError;
use crate::request::QrRequest;
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::debug;

/// Raw image bytes as returned by the QR service, never decoded here.
#[derive(Debug, Clone)]
pub struct QrImage {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

#[derive(Clone)]
pub struct QrClient {
    http: Client,
    base_url: String,
}

impl QrClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn fetch(&self, request: &QrRequest) -> Result<QrImage, QrError> {
        let url = request.url(&self.base_url);
        debug!(%url, "Requesting QR code for {request}");

        let response = self.http.get(url).send().await.map_err(QrError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            debug!(%status, "QR service refused {request}");
            return Err(QrError::Generation { status });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await.map_err(QrError::Body)?;

        Ok(QrImage { bytes, content_type })
    }
}
