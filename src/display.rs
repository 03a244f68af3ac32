use crate::blob::ObjectUrl;
use std::sync::{PoisonError, RwLock};

/// The on-page `<img>` whose source is the fetched QR image.
///
/// The element owns the object URL it shows, so replacing or clearing the
/// source releases the previous blob.
#[derive(Debug)]
pub struct DisplayElement {
    id: String,
    source: RwLock<Option<ObjectUrl>>,
}

impl DisplayElement {
    pub fn new(id: &str) -> Self {
        Self { id: id.to_string(), source: RwLock::new(None) }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> Option<String> {
        self.source
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(ObjectUrl::url)
    }

    pub fn set_source(&self, url: ObjectUrl) {
        let previous = self.source.write().unwrap_or_else(PoisonError::into_inner).replace(url);
        drop(previous);
    }

    pub fn clear(&self) {
        let previous = self.source.write().unwrap_or_else(PoisonError::into_inner).take();
        drop(previous);
    }
}
