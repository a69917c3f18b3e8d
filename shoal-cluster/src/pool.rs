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

use std::sync::Arc;

use hashbrown::HashMap;
use itertools::Itertools;
use parking_lot::Mutex;

use crate::{
    peer::{PeerConnector, PeerGetter, PeerPicker},
    ring::{default_ring_hasher, HashRing, RingHasher},
};

/// Virtual nodes per real node.
pub const DEFAULT_REPLICAS: usize = 50;

struct PoolState {
    ring: HashRing,
    getters: HashMap<String, Arc<dyn PeerGetter>>,
}

/// The transport-agnostic peer pool.
///
/// Holds this node's id, the consistent-hash ring over the current peer
/// set, and one client handle per peer. The ring is immutable between
/// `set_peers` calls; `pick` never observes a partially built ring and the
/// pool mutex is released before any fetch begins.
pub struct PeerPool {
    self_id: Arc<str>,
    replicas: usize,
    hasher: RingHasher,
    connector: Arc<dyn PeerConnector>,

    state: Mutex<PoolState>,
}

impl PeerPool {
    /// A pool for the node `self_id` with the default replication factor
    /// and ring hash.
    pub fn new(self_id: impl AsRef<str>, connector: Arc<dyn PeerConnector>) -> Self {
        Self::with_replicas(self_id, DEFAULT_REPLICAS, connector)
    }

    pub fn with_replicas(
        self_id: impl AsRef<str>,
        replicas: usize,
        connector: Arc<dyn PeerConnector>,
    ) -> Self {
        Self {
            self_id: Arc::from(self_id.as_ref()),
            replicas,
            hasher: default_ring_hasher(),
            connector,
            state: Mutex::new(PoolState {
                ring: HashRing::new(replicas),
                getters: HashMap::new(),
            }),
        }
    }

    /// Replace the ring hash.
    ///
    /// Every peer of the cluster must be configured with the same hash, or
    /// they will route the same key to different owners. Takes effect on
    /// the next `set_peers`.
    pub fn with_ring_hasher(mut self, hasher: RingHasher) -> Self {
        self.hasher = hasher;
        self
    }

    /// Replace the peer set.
    ///
    /// Builds a fresh ring and a fresh handle map, then swaps both in under
    /// the pool mutex. This is a full replacement, not a delta; the node's
    /// own id belongs in the set so the ring can route keys back to it.
    pub fn set_peers<I, S>(&self, peers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let peers = peers
            .into_iter()
            .map(|peer| peer.as_ref().to_owned())
            .collect_vec();

        let mut ring = HashRing::with_hasher(self.replicas, self.hasher.clone());
        ring.insert(peers.iter());
        let getters = peers
            .iter()
            .map(|peer| (peer.clone(), self.connector.connect(peer)))
            .collect();

        let mut state = self.state.lock();
        state.ring = ring;
        state.getters = getters;
        drop(state);

        tracing::debug!(self_id = %self.self_id, peers = peers.len(), "peer set replaced");
    }

    pub fn self_id(&self) -> &str {
        &self.self_id
    }
}

impl PeerPicker for PeerPool {
    fn pick(&self, key: &str) -> Option<Arc<dyn PeerGetter>> {
        let state = self.state.lock();
        let owner = state.ring.owner(key)?;
        if owner == &*self.self_id {
            return None;
        }
        tracing::trace!(self_id = %self.self_id, key, owner, "picked remote peer");
        state.getters.get(owner).cloned()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use bytes::Bytes;
    use shoal_common::error::Result;

    use super::*;

    struct NamedGetter(String);

    #[async_trait]
    impl PeerGetter for NamedGetter {
        async fn get(&self, _group: &str, _key: &str) -> Result<Bytes> {
            Ok(Bytes::from(self.0.clone()))
        }
    }

    struct NamedConnector;

    impl PeerConnector for NamedConnector {
        fn connect(&self, peer: &str) -> Arc<dyn PeerGetter> {
            Arc::new(NamedGetter(peer.to_owned()))
        }
    }

    async fn picked_peer(pool: &PeerPool, key: &str) -> Option<String> {
        match pool.pick(key) {
            Some(getter) => {
                let bytes = getter.get("g", key).await.unwrap();
                Some(String::from_utf8(bytes.to_vec()).unwrap())
            }
            None => None,
        }
    }

    #[tokio::test]
    async fn test_pick_routes_by_ring_and_never_to_self() {
        let pool = PeerPool::new("a", Arc::new(NamedConnector));
        pool.set_peers(["a", "b", "c"]);

        let mut ring = HashRing::new(DEFAULT_REPLICAS);
        ring.insert(["a", "b", "c"]);

        for i in 0..256 {
            let key = format!("key-{i}");
            let owner = ring.owner(&key).unwrap();
            match picked_peer(&pool, &key).await {
                Some(peer) => assert_eq!(peer, owner),
                None => assert_eq!(owner, "a"),
            }
        }
    }

    #[tokio::test]
    async fn test_empty_and_self_only_pools_pick_nothing() {
        let pool = PeerPool::new("a", Arc::new(NamedConnector));
        assert!(pool.pick("key").is_none());

        pool.set_peers(["a"]);
        assert!(pool.pick("key").is_none());
    }

    #[tokio::test]
    async fn test_set_peers_is_a_full_replacement() {
        let pool = PeerPool::new("a", Arc::new(NamedConnector));
        pool.set_peers(["a", "b"]);

        let routed_remote = (0..64).any(|i| pool.pick(&format!("key-{i}")).is_some());
        assert!(routed_remote);

        pool.set_peers(["a"]);
        for i in 0..64 {
            assert!(pool.pick(&format!("key-{i}")).is_none());
        }
    }
}
