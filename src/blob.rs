use crate::api::QrImage;
use dashmap::DashMap;
use rand::Rng;
use std::fmt;
use std::sync::Arc;

const URL_PREFIX: &str = "/blob/";
const ID_LENGTH: usize = 32;

/// Process-local registry of image bytes reachable through `/blob/{id}`.
#[derive(Default)]
pub struct BlobStore {
    blobs: DashMap<String, QrImage>,
}

impl BlobStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers `image` and returns the handle that keeps it alive.
    pub fn create_object_url(self: &Arc<Self>, image: QrImage) -> ObjectUrl {
        let mut id = random_id(ID_LENGTH);
        while self.blobs.contains_key(&id) {
            id = random_id(ID_LENGTH);
        }
        self.blobs.insert(id.clone(), image);
        ObjectUrl { id, store: Arc::clone(self) }
    }

    pub fn get(&self, id: &str) -> Option<QrImage> {
        self.blobs.get(id).map(|entry| entry.value().clone())
    }

    /// Looks up an object URL as handed out by [`ObjectUrl::url`].
    pub fn resolve(&self, url: &str) -> Option<QrImage> {
        self.get(url.strip_prefix(URL_PREFIX)?)
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    fn revoke(&self, id: &str) {
        self.blobs.remove(id);
    }
}

/// Owning handle to a registered blob. Dropping it revokes the URL.
pub struct ObjectUrl {
    id: String,
    store: Arc<BlobStore>,
}

impl ObjectUrl {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn url(&self) -> String {
        format!("{URL_PREFIX}{}", self.id())
    }
}

impl fmt::Debug for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObjectUrl").field(&self.url()).finish()
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        self.store.revoke(&self.id);
    }
}

/// Generates random URL-safe string of given length
fn random_id(length: usize) -> String {
    let chars: Vec<char> = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789".chars().collect();
    let mut rng = rand::thread_rng();
    (0..length).map(|_| chars[rng.gen_range(0..chars.len())]).collect()
}
