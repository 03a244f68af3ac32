use crate::api::QrClient;
use crate::blob::BlobStore;
use crate::display::DisplayElement;
use crate::error::QrError;
use crate::request::QrRequest;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{error, info};

const DIAGNOSTICS_CAPACITY: usize = 64;

#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub timestamp: u64,
    pub request: String,
    pub kind: &'static str,
    pub message: String,
}

/// Operator-facing error channel: every report is logged and kept in a small ring.
#[derive(Default)]
pub struct Diagnostics {
    entries: Mutex<VecDeque<Diagnostic>>,
}

impl Diagnostics {
    pub fn report(&self, request: &QrRequest, err: &QrError) {
        error!(kind = err.kind(), "Error: {err} ({request})");
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let entry = Diagnostic {
            timestamp,
            request: request.to_string(),
            kind: err.kind(),
            message: err.to_string(),
        };
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.len() == DIAGNOSTICS_CAPACITY {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }
}

/// Fetches QR images and binds them to the page's display element.
pub struct QrRenderer {
    client: QrClient,
    store: Arc<BlobStore>,
    element: DisplayElement,
    diagnostics: Diagnostics,
}

impl QrRenderer {
    pub fn new(client: QrClient, element_id: &str) -> Self {
        Self {
            client,
            store: BlobStore::new(),
            element: DisplayElement::new(element_id),
            diagnostics: Diagnostics::default(),
        }
    }

    pub fn store(&self) -> &BlobStore {
        &self.store
    }

    pub fn element(&self) -> &DisplayElement {
        &self.element
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Returns whether the element now shows a fresh image. Failures are
    /// reported to [`Diagnostics`] and leave the element as it was.
    pub async fn generate_qr_code(&self, request: &QrRequest) -> bool {
        match self.client.fetch(request).await {
            Ok(image) => {
                let size = image.bytes.len();
                let url = self.store.create_object_url(image);
                info!(src = %url.url(), size, "Rendered QR code for {request} into #{}", self.element.id());
                self.element.set_source(url);
                true
            }
            Err(e) => {
                self.diagnostics.report(request, &e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock;

    async fn renderer() -> QrRenderer {
        QrRenderer::new(QrClient::new(&mock::spawn().await), "qrCode")
    }

    #[tokio::test]
    async fn success_binds_exact_bytes() {
        let renderer = renderer().await;
        assert!(renderer.generate_qr_code(&QrRequest::event(1).unwrap()).await);

        let src = renderer.element().source().expect("source set");
        let image = renderer.store().resolve(&src).expect("live blob");
        assert_eq!(&image.bytes[..], mock::JPEG);
        assert_eq!(&image.bytes[..2], &[0xFF_u8, 0xD8]);
        assert!(renderer.diagnostics().snapshot().is_empty());
    }

    #[tokio::test]
    async fn failure_status_leaves_element_untouched() {
        for id in [404, 500] {
            let renderer = renderer().await;
            assert!(renderer.generate_qr_code(&QrRequest::ByEventId(1)).await);
            let before = renderer.element().source();

            assert!(!renderer.generate_qr_code(&QrRequest::ByEventId(id)).await);

            assert_eq!(renderer.element().source(), before);
            let diagnostics = renderer.diagnostics().snapshot();
            assert_eq!(diagnostics.len(), 1);
            assert_eq!(diagnostics[0].kind, "generation");
            assert_eq!(diagnostics[0].message, "QR Code generation failed");
            assert_eq!(diagnostics[0].request, format!("event {id}"));
        }
    }

    #[tokio::test]
    async fn transport_failure_leaves_element_untouched() {
        let renderer = QrRenderer::new(QrClient::new(&mock::unreachable()), "qrCode");
        assert!(!renderer.generate_qr_code(&QrRequest::ByEventId(1)).await);

        assert!(renderer.element().source().is_none());
        assert_eq!(renderer.store().len(), 0);
        let diagnostics = renderer.diagnostics().snapshot();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, "transport");
    }

    #[tokio::test]
    async fn body_failure_leaves_element_untouched() {
        let renderer = QrRenderer::new(QrClient::new(&mock::truncated().await), "qrCode");
        assert!(!renderer.generate_qr_code(&QrRequest::ByEventId(1)).await);

        assert!(renderer.element().source().is_none());
        assert_eq!(renderer.store().len(), 0);
        let diagnostics = renderer.diagnostics().snapshot();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, "body");
    }

    #[tokio::test]
    async fn rerender_releases_previous_blob() {
        let renderer = renderer().await;
        assert!(renderer.generate_qr_code(&QrRequest::ByEventId(1)).await);
        let first = renderer.element().source().unwrap();
        assert!(renderer.generate_qr_code(&QrRequest::payload("next").unwrap()).await);

        assert!(renderer.store().resolve(&first).is_none());
        assert_eq!(renderer.store().len(), 1);
        let src = renderer.element().source().unwrap();
        assert_eq!(&renderer.store().resolve(&src).unwrap().bytes[..], b"next");
    }

    #[test]
    fn diagnostics_ring_is_bounded() {
        let diagnostics = Diagnostics::default();
        let request = QrRequest::ByEventId(1);
        let err = QrError::Generation { status: http::StatusCode::BAD_GATEWAY };
        for _ in 0..DIAGNOSTICS_CAPACITY + 5 {
            diagnostics.report(&request, &err);
        }
        assert_eq!(diagnostics.snapshot().len(), DIAGNOSTICS_CAPACITY);
    }
}
