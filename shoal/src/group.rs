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

use std::sync::{atomic::Ordering, Arc, OnceLock};

use async_trait::async_trait;

use crate::{
    builder::GroupBuilder,
    cluster::{PeerGetter, PeerPicker},
    common::{
        code::ByteView,
        error::{Error, ErrorKind, Result},
        singleflight::SingleFlight,
    },
    memory::{MemCache, Metrics},
};

/// The source-of-truth loader for a group.
///
/// Invoked when a key misses the local cache and either is owned by this
/// node or could not be fetched from its owner peer. Loaders own their
/// deadlines: on timeout they must return an error so coalesced waiters can
/// drain. A wedged loader wedges all waiters for that key.
#[async_trait]
pub trait Loader: Send + Sync + 'static {
    /// Load the raw value for `key` from the source of truth.
    async fn load(&self, key: &str) -> anyhow::Result<Vec<u8>>;
}

#[async_trait]
impl<F, Fut> Loader for F
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = anyhow::Result<Vec<u8>>> + Send + 'static,
{
    async fn load(&self, key: &str) -> anyhow::Result<Vec<u8>> {
        (self)(key.to_owned()).await
    }
}

pub(crate) struct GroupInner {
    name: String,
    loader: Arc<dyn Loader>,
    cache: MemCache,

    peers: OnceLock<Arc<dyn PeerPicker>>,
    flights: SingleFlight<ByteView>,
}

/// A named cache namespace with its own byte budget and source loader.
///
/// `Group` is a cheap-clone handle; clones share the cache, the registered
/// peer picker, and the in-flight load table.
pub struct Group {
    inner: Arc<GroupInner>,
}

impl Clone for Group {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl std::fmt::Debug for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Group").field("name", &self.inner.name).finish()
    }
}

impl Group {
    /// Start building a group with the given name.
    pub fn builder(name: impl Into<String>) -> GroupBuilder {
        GroupBuilder::new(name)
    }

    pub(crate) fn new(name: String, loader: Arc<dyn Loader>, cache: MemCache) -> Self {
        Self {
            inner: Arc::new(GroupInner {
                name,
                loader,
                cache,
                peers: OnceLock::new(),
                flights: SingleFlight::new(),
            }),
        }
    }

    /// The group's name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Counters for this group's cache and load paths.
    pub fn metrics(&self) -> &Metrics {
        self.inner.cache.metrics()
    }

    /// Number of locally cached entries.
    pub fn len(&self) -> usize {
        self.inner.cache.len()
    }

    /// Whether the local cache is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.cache.is_empty()
    }

    /// Bytes currently held by the local cache.
    pub fn usage(&self) -> usize {
        self.inner.cache.usage()
    }

    /// Register the peer picker that routes misses across the cluster.
    ///
    /// One-shot: registering twice on the same group is a programming error
    /// and panics.
    pub fn register_peers(&self, picker: Arc<dyn PeerPicker>) {
        if self.inner.peers.set(picker).is_err() {
            panic!("peers already registered for group {}", self.name());
        }
    }

    /// Read `key` through the cache.
    ///
    /// Local hit, else the owner peer, else the source loader; concurrent
    /// misses for the same key share a single load.
    pub async fn get(&self, key: &str) -> Result<ByteView> {
        if key.is_empty() {
            return Err(Error::new(ErrorKind::Input, "key must not be empty"));
        }

        if let Some(view) = self.inner.cache.get(key) {
            tracing::trace!(group = self.name(), key, "cache hit");
            return Ok(view);
        }

        self.load(key).await
    }

    async fn load(&self, key: &str) -> Result<ByteView> {
        self.inner.flights.flight(key, || self.load_once(key)).await
    }

    async fn load_once(&self, key: &str) -> Result<ByteView> {
        if let Some(peer) = self.inner.peers.get().and_then(|picker| picker.pick(key)) {
            match self.load_from_peer(peer, key).await {
                Ok(view) => return Ok(view),
                Err(e) => {
                    tracing::warn!(group = self.name(), key, error = %e, "peer fetch failed, falling back to source");
                }
            }
        }

        self.load_from_source(key).await
    }

    async fn load_from_peer(&self, peer: Arc<dyn PeerGetter>, key: &str) -> Result<ByteView> {
        self.metrics().peer_fetch.fetch_add(1, Ordering::Relaxed);
        let bytes = peer.get(self.name(), key).await?;
        // The owner peer is authoritative for this key; caching its value
        // here would duplicate storage for keys this node does not own.
        Ok(ByteView::from(bytes))
    }

    async fn load_from_source(&self, key: &str) -> Result<ByteView> {
        self.metrics().load.fetch_add(1, Ordering::Relaxed);
        let bytes = self
            .inner
            .loader
            .load(key)
            .await
            .map_err(|e| Error::caused_by(ErrorKind::Source, "source loader failed", e))?;

        let view = ByteView::from(bytes);
        self.inner.cache.insert(key, view.clone());
        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use bytes::Bytes;
    use parking_lot::Mutex;

    use super::*;
    use crate::registry::Registry;

    fn scores_loader(
        calls: Arc<Mutex<hashbrown::HashMap<String, usize>>>,
    ) -> impl Loader {
        move |key: String| {
            let calls = calls.clone();
            async move {
                let value = match key.as_str() {
                    "Tom" => "630",
                    "Jack" => "589",
                    "Sam" => "567",
                    _ => anyhow::bail!("{key} not exist"),
                };
                *calls.lock().entry(key).or_insert(0) += 1;
                Ok(value.as_bytes().to_vec())
            }
        }
    }

    fn scores_group(registry: &Registry) -> (Group, Arc<Mutex<hashbrown::HashMap<String, usize>>>) {
        let calls = Arc::new(Mutex::new(hashbrown::HashMap::new()));
        let group = Group::builder("scores")
            .with_capacity(2 << 10)
            .build_in(registry, scores_loader(calls.clone()));
        (group, calls)
    }

    #[tokio::test]
    async fn test_empty_key_is_rejected() {
        let (group, _) = scores_group(&Registry::new());
        let err = group.get("").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Input);
    }

    #[tokio::test]
    async fn test_read_through_and_cache_hit() {
        let (group, calls) = scores_group(&Registry::new());

        let view = group.get("Tom").await.unwrap();
        assert_eq!(view.as_bytes(), b"630");
        assert_eq!(calls.lock()["Tom"], 1);

        let view = group.get("Tom").await.unwrap();
        assert_eq!(view.as_bytes(), b"630");
        assert_eq!(calls.lock()["Tom"], 1);

        let err = group.get("unknown").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Source);
    }

    #[tokio::test]
    async fn test_loader_errors_are_not_cached() {
        let (group, _) = scores_group(&Registry::new());

        group.get("unknown").await.unwrap_err();
        assert_eq!(group.len(), 0);

        // The source can start answering later; nothing poisoned the key.
        group.get("Sam").await.unwrap();
        assert_eq!(group.len(), 1);
    }

    struct FixedPeer {
        payload: Option<Bytes>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PeerGetter for FixedPeer {
        async fn get(&self, _group: &str, _key: &str) -> Result<Bytes> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            match &self.payload {
                Some(payload) => Ok(payload.clone()),
                None => Err(Error::new(ErrorKind::Peer, "peer unavailable")),
            }
        }
    }

    struct PickAll(Arc<FixedPeer>);

    impl PeerPicker for PickAll {
        fn pick(&self, _key: &str) -> Option<Arc<dyn PeerGetter>> {
            Some(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_remote_values_are_served_but_not_cached() {
        let (group, calls) = scores_group(&Registry::new());
        let peer = Arc::new(FixedPeer {
            payload: Some(Bytes::from_static(b"630")),
            calls: AtomicUsize::new(0),
        });
        group.register_peers(Arc::new(PickAll(peer.clone())));

        let view = group.get("Tom").await.unwrap();
        assert_eq!(view.as_bytes(), b"630");
        assert_eq!(peer.calls.load(Ordering::Relaxed), 1);
        assert!(calls.lock().is_empty());
        assert_eq!(group.len(), 0);

        // Still remote on the next read: nothing was cached locally.
        group.get("Tom").await.unwrap();
        assert_eq!(peer.calls.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn test_peer_failure_falls_back_to_the_source() {
        let (group, calls) = scores_group(&Registry::new());
        let peer = Arc::new(FixedPeer {
            payload: None,
            calls: AtomicUsize::new(0),
        });
        group.register_peers(Arc::new(PickAll(peer.clone())));

        let view = group.get("Tom").await.unwrap();
        assert_eq!(view.as_bytes(), b"630");
        assert_eq!(peer.calls.load(Ordering::Relaxed), 1);
        assert_eq!(calls.lock()["Tom"], 1);

        // The fallback value was cached, so the broken peer is not retried.
        group.get("Tom").await.unwrap();
        assert_eq!(peer.calls.load(Ordering::Relaxed), 1);
        assert_eq!(calls.lock()["Tom"], 1);
    }

    #[tokio::test]
    #[should_panic(expected = "peers already registered")]
    async fn test_register_peers_is_one_shot() {
        let (group, _) = scores_group(&Registry::new());
        let peer = Arc::new(FixedPeer {
            payload: None,
            calls: AtomicUsize::new(0),
        });
        group.register_peers(Arc::new(PickAll(peer.clone())));
        group.register_peers(Arc::new(PickAll(peer)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_misses_share_one_load() {
        let calls = Arc::new(AtomicUsize::new(0));
        let group = {
            let calls = calls.clone();
            Group::builder("slow").with_capacity(1 << 10).build_in(
                &Registry::new(),
                move |key: String| {
                    let calls = calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::Relaxed);
                        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                        Ok(key.into_bytes())
                    }
                },
            )
        };

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let group = group.clone();
                tokio::spawn(async move { group.get("K").await })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap().as_bytes(), b"K");
        }
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }
}
