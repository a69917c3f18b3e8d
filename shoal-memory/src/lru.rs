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

use hashbrown::HashMap;
use shoal_common::{
    code::ByteView,
    slab::{Slab, Token},
};

use crate::{listener::EvictionListener, metrics::Metrics};

struct Node {
    key: Arc<str>,
    value: ByteView,

    prev: Option<Token>,
    next: Option<Token>,
}

impl Node {
    /// An entry is charged for its key and its value.
    fn weight(&self) -> usize {
        self.key.len() + self.value.len()
    }
}

/// A byte-bounded recency cache. Not safe for concurrent mutation; wrap it
/// in [`MemCache`](crate::MemCache) for that.
///
/// The recency order is a doubly linked list threaded through a slab arena
/// by token (head = most recently used), with a key index pointing into the
/// arena. The index and the list always hold the same key set, and `usage`
/// always equals the summed weight of the resident entries.
pub struct Lru {
    /// Max bytes. Zero disables capacity evictions.
    capacity: usize,
    usage: usize,

    nodes: Slab<Node>,
    head: Option<Token>,
    tail: Option<Token>,
    index: HashMap<Arc<str>, Token>,

    listener: Option<Arc<dyn EvictionListener>>,
    metrics: Arc<Metrics>,
}

impl Lru {
    pub fn new(capacity: usize) -> Self {
        Self::with_hooks(capacity, None, Arc::new(Metrics::default()))
    }

    pub fn with_eviction_listener(capacity: usize, listener: Arc<dyn EvictionListener>) -> Self {
        Self::with_hooks(capacity, Some(listener), Arc::new(Metrics::default()))
    }

    pub(crate) fn with_hooks(
        capacity: usize,
        listener: Option<Arc<dyn EvictionListener>>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            capacity,
            usage: 0,
            nodes: Slab::new(),
            head: None,
            tail: None,
            index: HashMap::new(),
            listener,
            metrics,
        }
    }

    /// Insert or update an entry, marking it most recently used, then evict
    /// from the tail until the engine fits its capacity again.
    ///
    /// Growing a resident value can evict older entries and, if the engine
    /// still overflows after they are gone, the freshly written key itself.
    /// Callers tolerate a miss on the next `get` in that case.
    pub fn insert(&mut self, key: &str, value: ByteView) {
        match self.index.get(key).copied() {
            Some(token) => {
                let node = self.nodes.get_mut(token).unwrap();
                self.usage += value.len();
                self.usage -= node.value.len();
                node.value = value;
                self.move_to_head(token);
                self.metrics.replace.fetch_add(1, Ordering::Relaxed);
            }
            None => {
                let key: Arc<str> = Arc::from(key);
                let token = self.nodes.insert(Node {
                    key: key.clone(),
                    value,
                    prev: None,
                    next: None,
                });
                self.link_head(token);
                self.usage += self.nodes.get(token).unwrap().weight();
                self.index.insert(key, token);
                self.metrics.insert.fetch_add(1, Ordering::Relaxed);
            }
        }

        while self.capacity > 0 && self.usage > self.capacity {
            self.remove_oldest();
        }
    }

    /// Look up an entry, marking it most recently used on a hit.
    pub fn get(&mut self, key: &str) -> Option<ByteView> {
        let token = self.index.get(key).copied()?;
        self.move_to_head(token);
        Some(self.nodes.get(token).unwrap().value.clone())
    }

    /// Evict the least-recently-used entry and hand it to the eviction
    /// listener, if one is configured. Silent on an empty engine.
    pub fn remove_oldest(&mut self) -> Option<(Arc<str>, ByteView)> {
        let token = self.tail?;
        self.unlink(token);
        let node = self.nodes.remove(token).unwrap();
        self.index.remove(&*node.key);
        self.usage -= node.weight();
        self.metrics.evict.fetch_add(1, Ordering::Relaxed);

        // State is consistent before the listener observes the entry.
        if let Some(listener) = self.listener.as_ref() {
            listener.on_evict(&node.key, &node.value);
        }

        Some((node.key, node.value))
    }

    /// Number of resident entries.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Bytes currently charged, summed over `key.len() + value.len()`.
    pub fn usage(&self) -> usize {
        self.usage
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn unlink(&mut self, token: Token) {
        let (prev, next) = {
            let node = self.nodes.get(token).unwrap();
            (node.prev, node.next)
        };

        match prev {
            Some(prev) => self.nodes.get_mut(prev).unwrap().next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.nodes.get_mut(next).unwrap().prev = prev,
            None => self.tail = prev,
        }

        let node = self.nodes.get_mut(token).unwrap();
        node.prev = None;
        node.next = None;
    }

    fn link_head(&mut self, token: Token) {
        let old_head = self.head;
        {
            let node = self.nodes.get_mut(token).unwrap();
            node.prev = None;
            node.next = old_head;
        }
        if let Some(old_head) = old_head {
            self.nodes.get_mut(old_head).unwrap().prev = Some(token);
        }
        self.head = Some(token);
        if self.tail.is_none() {
            self.tail = Some(token);
        }
    }

    fn move_to_head(&mut self, token: Token) {
        if self.head == Some(token) {
            return;
        }
        self.unlink(token);
        self.link_head(token);
    }
}
