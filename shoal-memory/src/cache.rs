// Copyright 2025 shoal Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::{atomic::Ordering, Arc};

use parking_lot::Mutex;
use shoal_common::code::ByteView;

use crate::{listener::EvictionListener, lru::Lru, metrics::Metrics};

/// The concurrent shell over [`Lru`].
///
/// A single mutex guards the engine: reads move entries in the recency
/// order too, so a reader-writer lock would buy nothing. The engine is
/// built lazily by the first `insert` and is never exposed to callers.
pub struct MemCache {
    capacity: usize,
    listener: Option<Arc<dyn EvictionListener>>,
    metrics: Arc<Metrics>,

    inner: Mutex<Option<Lru>>,
}

impl MemCache {
    /// A shell whose engine will be capped at `capacity` bytes.
    /// Zero disables capacity evictions.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            listener: None,
            metrics: Arc::new(Metrics::default()),
            inner: Mutex::new(None),
        }
    }

    /// Install an eviction listener. Takes effect when the engine is built,
    /// i.e. before the first insert.
    pub fn with_eviction_listener(mut self, listener: Arc<dyn EvictionListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn get(&self, key: &str) -> Option<ByteView> {
        let res = self.inner.lock().as_mut().and_then(|lru| lru.get(key));
        match res {
            Some(_) => self.metrics.hit.fetch_add(1, Ordering::Relaxed),
            None => self.metrics.miss.fetch_add(1, Ordering::Relaxed),
        };
        res
    }

    pub fn insert(&self, key: &str, value: ByteView) {
        self.inner
            .lock()
            .get_or_insert_with(|| {
                Lru::with_hooks(self.capacity, self.listener.clone(), self.metrics.clone())
            })
            .insert(key, value);
    }

    /// Number of resident entries. Zero before the first insert.
    pub fn len(&self) -> usize {
        self.inner.lock().as_ref().map_or(0, |lru| lru.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes currently charged. Zero before the first insert.
    pub fn usage(&self) -> usize {
        self.inner.lock().as_ref().map_or(0, |lru| lru.usage())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}
