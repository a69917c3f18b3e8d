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

use std::{fmt::Debug, sync::Arc};

use hashbrown::HashMap;

/// Hash function for ring placement.
///
/// All peers of a cluster must agree on it, or they will route the same key
/// to different owners.
pub type RingHasher = Arc<dyn Fn(&[u8]) -> u32 + Send + Sync>;

pub(crate) fn default_ring_hasher() -> RingHasher {
    Arc::new(|data| crc32fast::hash(data))
}

/// A consistent-hash ring with virtual nodes.
///
/// Each real node occupies `replicas` positions on the ring; a key is owned
/// by the node behind the first position at or clockwise past the key's
/// hash. The placement is fully determined by `(replicas, hasher, node
/// set)` regardless of insertion order.
pub struct HashRing {
    hasher: RingHasher,
    replicas: usize,

    /// Virtual-node positions, sorted ascending.
    ring: Vec<u32>,
    /// Position to real-node id. On a position collision the last written
    /// node wins.
    owners: HashMap<u32, Arc<str>>,
}

impl Debug for HashRing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashRing")
            .field("replicas", &self.replicas)
            .field("positions", &self.ring.len())
            .finish()
    }
}

impl HashRing {
    /// A ring hashed with CRC-32/IEEE.
    pub fn new(replicas: usize) -> Self {
        Self::with_hasher(replicas, default_ring_hasher())
    }

    pub fn with_hasher(replicas: usize, hasher: RingHasher) -> Self {
        assert!(replicas > 0, "replicas must be greater than zero.");

        Self {
            hasher,
            replicas,
            ring: Vec::new(),
            owners: HashMap::new(),
        }
    }

    /// Add real nodes to the ring.
    ///
    /// Every node contributes `replicas` virtual positions, hashed from the
    /// replica ordinal (decimal, no leading zeros) prepended to the node id.
    pub fn insert<I, S>(&mut self, nodes: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for node in nodes {
            let node: Arc<str> = Arc::from(node.as_ref());
            for i in 0..self.replicas {
                let position = (self.hasher)(format!("{}{}", i, node).as_bytes());
                self.ring.push(position);
                self.owners.insert(position, node.clone());
            }
        }
        self.ring.sort_unstable();
    }

    /// The id of the node that owns `key`, or `None` on an empty ring.
    pub fn owner(&self, key: &str) -> Option<&str> {
        if self.ring.is_empty() {
            return None;
        }

        let hash = (self.hasher)(key.as_bytes());
        // First position at or past the hash, wrapping past the end.
        let idx = self.ring.partition_point(|&position| position < hash);
        let position = self.ring[idx % self.ring.len()];
        self.owners.get(&position).map(|owner| &**owner)
    }

    /// Number of virtual-node positions on the ring.
    pub fn positions(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }
}
