use std::collections::HashMap;
use std::io;
use std::sync::Mutex;

use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;

use crate::application::ports::{StagingStore, StagingStoreError};
use crate::domain::StoragePath;

/// Staging store backed by a map; lets tests observe that the worker
/// releases files.
#[derive(Default)]
pub struct InMemoryStagingStore {
    inner: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryStagingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, path: &StoragePath) -> bool {
        let inner = self.inner.lock().expect("staging store poisoned");
        inner.contains_key(path.as_str())
    }

    pub fn object_count(&self) -> usize {
        let inner = self.inner.lock().expect("staging store poisoned");
        inner.len()
    }
}

#[async_trait::async_trait]
impl StagingStore for InMemoryStagingStore {
    async fn store(
        &self,
        path: &StoragePath,
        mut stream: BoxStream<'_, Result<Bytes, io::Error>>,
    ) -> Result<u64, StagingStoreError> {
        let mut data = Vec::new();
        while let Some(chunk) = stream.next().await {
            data.extend_from_slice(&chunk?);
        }

        let total = data.len() as u64;
        let mut inner = self.inner.lock().expect("staging store poisoned");
        inner.insert(path.as_str().to_string(), data);
        Ok(total)
    }

    async fn fetch(&self, path: &StoragePath) -> Result<Vec<u8>, StagingStoreError> {
        let inner = self.inner.lock().expect("staging store poisoned");
        inner
            .get(path.as_str())
            .cloned()
            .ok_or_else(|| StagingStoreError::NotFound(path.to_string()))
    }

    async fn delete(&self, path: &StoragePath) -> Result<(), StagingStoreError> {
        let mut inner = self.inner.lock().expect("staging store poisoned");
        inner.remove(path.as_str());
        Ok(())
    }

    async fn head(&self, path: &StoragePath) -> Result<u64, StagingStoreError> {
        let inner = self.inner.lock().expect("staging store poisoned");
        inner
            .get(path.as_str())
            .map(|d| d.len() as u64)
            .ok_or_else(|| StagingStoreError::NotFound(path.to_string()))
    }
}
