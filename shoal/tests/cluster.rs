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

//! End-to-end scenarios over an in-process three-node cluster.
//!
//! The transport is a direct call into the target node's group, which keeps
//! the routing, coalescing and fallback behavior observable without any
//! wire plumbing.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use itertools::Itertools;
use parking_lot::Mutex;
use shoal::prelude::*;

const NODES: [&str; 3] = ["cache-1", "cache-2", "cache-3"];

type LoadCounts = Arc<Mutex<hashbrown::HashMap<(String, String), usize>>>;

/// A peer handle that calls straight into the target node's group.
struct DirectGetter {
    group: Group,
}

#[async_trait]
impl PeerGetter for DirectGetter {
    async fn get(&self, _group: &str, key: &str) -> Result<Bytes> {
        self.group.get(key).await.map(ByteView::into_bytes)
    }
}

struct Mesh {
    nodes: hashbrown::HashMap<String, Group>,
}

impl PeerConnector for Mesh {
    fn connect(&self, peer: &str) -> Arc<dyn PeerGetter> {
        Arc::new(DirectGetter {
            group: self.nodes[peer].clone(),
        })
    }
}

struct Cluster {
    groups: hashbrown::HashMap<String, Group>,
    counts: LoadCounts,
    /// Mirrors the pools' rings to predict key owners.
    ring: HashRing,
}

impl Cluster {
    fn new() -> Self {
        let counts: LoadCounts = Arc::new(Mutex::new(hashbrown::HashMap::new()));

        // One registry per node: each node is its own process in spirit.
        let groups: hashbrown::HashMap<String, Group> = NODES
            .iter()
            .map(|&node| {
                let counts = counts.clone();
                let registry = Registry::new();
                let group = Group::builder("scores").with_capacity(2 << 10).build_in(
                    &registry,
                    move |key: String| {
                        let counts = counts.clone();
                        let node = node.to_string();
                        async move {
                            let value = match key.as_str() {
                                "Tom" => "630",
                                "Jack" => "589",
                                "Sam" => "567",
                                _ => anyhow::bail!("{key} not exist"),
                            };
                            *counts.lock().entry((node, key)).or_insert(0) += 1;
                            Ok(value.as_bytes().to_vec())
                        }
                    },
                );
                (node.to_string(), group)
            })
            .collect();

        for (node, group) in groups.iter() {
            let pool = PeerPool::new(
                node,
                Arc::new(Mesh {
                    nodes: groups.clone(),
                }),
            );
            pool.set_peers(NODES);
            group.register_peers(Arc::new(pool));
        }

        let mut ring = HashRing::new(DEFAULT_REPLICAS);
        ring.insert(NODES);

        Self {
            groups,
            counts,
            ring,
        }
    }

    fn group(&self, node: &str) -> &Group {
        &self.groups[node]
    }

    fn owner(&self, key: &str) -> &str {
        self.ring.owner(key).unwrap()
    }

    fn loads(&self, node: &str, key: &str) -> usize {
        self.counts
            .lock()
            .get(&(node.to_string(), key.to_string()))
            .copied()
            .unwrap_or(0)
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_reads_load_exactly_once_on_the_owner() {
    let cluster = Cluster::new();

    for (key, value) in [("Tom", "630"), ("Jack", "589"), ("Sam", "567")] {
        let owner = cluster.owner(key);

        let view = cluster.group("cache-1").get(key).await.unwrap();
        assert_eq!(view.as_bytes(), value.as_bytes());

        for &node in NODES.iter() {
            let expected = usize::from(node == owner);
            assert_eq!(cluster.loads(node, key), expected, "key {key} node {node}");
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_remote_keys_stay_on_their_owner() {
    let cluster = Cluster::new();

    let keys = ["Tom", "Jack", "Sam"];
    let remote = keys
        .iter()
        .find(|&&key| cluster.owner(key) != "cache-1")
        .copied()
        .expect("some key must land on a remote owner");
    let owner = cluster.owner(remote);

    cluster.group("cache-1").get(remote).await.unwrap();
    assert_eq!(cluster.group("cache-1").len(), 0);
    assert_eq!(cluster.group(owner).len(), 1);

    // Repeated remote reads hit the owner's cache, not its loader.
    cluster.group("cache-1").get(remote).await.unwrap();
    cluster.group("cache-2").get(remote).await.unwrap();
    assert_eq!(cluster.loads(owner, remote), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_locally_owned_keys_are_cached_locally() {
    let cluster = Cluster::new();

    let keys = ["Tom", "Jack", "Sam"];
    let Some(local) = keys.iter().find(|&&key| cluster.owner(key) == "cache-1") else {
        // Placement put every score on a remote node; nothing to assert here.
        return;
    };

    let group = cluster.group("cache-1");
    group.get(local).await.unwrap();
    assert_eq!(group.len(), 1);
    assert_eq!(cluster.loads("cache-1", local), 1);

    group.get(local).await.unwrap();
    assert_eq!(cluster.loads("cache-1", local), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_every_node_agrees_on_every_key() {
    let cluster = Cluster::new();

    let reads = NODES
        .iter()
        .cartesian_product([("Tom", "630"), ("Jack", "589"), ("Sam", "567")])
        .collect_vec();

    for (&node, (key, value)) in reads {
        let view = cluster.group(node).get(key).await.unwrap();
        assert_eq!(view.as_bytes(), value.as_bytes(), "node {node} key {key}");
        // Wherever the reads came from, only the owner ever loaded the key.
        assert_eq!(cluster.loads(cluster.owner(key), key), 1);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_keys_error_on_every_node() {
    let cluster = Cluster::new();

    for &node in NODES.iter() {
        let err = cluster.group(node).get("unknown").await.unwrap_err();
        // The owner surfaces a source error; other nodes see the failed
        // peer hop fall back to their own loader, which also fails.
        assert_eq!(err.kind(), ErrorKind::Source, "node {node}");
    }
}
