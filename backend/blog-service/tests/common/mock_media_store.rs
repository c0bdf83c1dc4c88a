/// Recording in-memory double for the media host.
///
/// Every `store` hands out a fresh public id; every `release` call is
/// recorded even when it is told to fail, so tests can assert on the exact
/// sequence of interactions.
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use blog_service::media::{MediaStore, MediaStoreError, StoredImage};

#[derive(Default)]
pub struct MockMediaStore {
    next_id: AtomicUsize,
    fail_store: AtomicBool,
    fail_release: AtomicBool,
    stored: Mutex<Vec<String>>,
    released: Mutex<Vec<String>>,
}

impl MockMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_store(&self) {
        self.fail_store.store(true, Ordering::SeqCst);
    }

    pub fn fail_release(&self) {
        self.fail_release.store(true, Ordering::SeqCst);
    }

    pub fn stored_ids(&self) -> Vec<String> {
        self.stored.lock().unwrap().clone()
    }

    pub fn released_ids(&self) -> Vec<String> {
        self.released.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaStore for MockMediaStore {
    async fn store(
        &self,
        _data: Vec<u8>,
        _original_filename: &str,
    ) -> Result<StoredImage, MediaStoreError> {
        if self.fail_store.load(Ordering::SeqCst) {
            return Err(MediaStoreError::Rejected {
                status: 500,
                message: "injected store failure".to_string(),
            });
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let public_id = format!("mock-{id}");
        self.stored.lock().unwrap().push(public_id.clone());

        Ok(StoredImage {
            url: format!("https://media.test/{public_id}.png"),
            public_id,
        })
    }

    async fn release(&self, public_id: &str) -> Result<(), MediaStoreError> {
        self.released.lock().unwrap().push(public_id.to_string());

        if self.fail_release.load(Ordering::SeqCst) {
            return Err(MediaStoreError::Rejected {
                status: 500,
                message: "injected release failure".to_string(),
            });
        }
        Ok(())
    }
}
