//! In-memory object store

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{ObjectInfo, ObjectPage, ObjectStore};
use crate::error::{ReportError, Result};

const DEFAULT_PAGE_SIZE: usize = 1000;

/// Object store held in memory
///
/// Objects are listed in name order. Calls are counted so callers can check
/// how much of the store was touched.
#[derive(Debug)]
pub struct MemoryStore {
    objects: BTreeMap<String, Vec<u8>>,
    page_size: usize,
    latency: Option<Duration>,
    list_calls: AtomicUsize,
    read_calls: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            objects: BTreeMap::new(),
            page_size: page_size.max(1),
            latency: None,
            list_calls: AtomicUsize::new(0),
            read_calls: AtomicUsize::new(0),
        }
    }

    /// Delay every store call by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, body: impl Into<Vec<u8>>) {
        self.objects.insert(name.into(), body.into());
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn read_calls(&self) -> usize {
        self.read_calls.load(Ordering::SeqCst)
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_page(&self, prefix: &str, page_token: Option<String>) -> Result<ObjectPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.delay().await;

        let offset = match page_token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|e| ReportError::malformed("page token", e))?,
            None => 0,
        };

        let matching: Vec<&String> = self
            .objects
            .keys()
            .filter(|name| name.starts_with(prefix))
            .collect();

        let objects = matching
            .iter()
            .skip(offset)
            .take(self.page_size)
            .map(|name| ObjectInfo {
                name: (*name).clone(),
            })
            .collect();

        let next = offset + self.page_size;
        let next_page_token = (next < matching.len()).then(|| next.to_string());

        Ok(ObjectPage {
            objects,
            next_page_token,
        })
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        self.delay().await;

        self.objects
            .get(name)
            .cloned()
            .ok_or_else(|| ReportError::unreachable("failed to read object", name))
    }
}
