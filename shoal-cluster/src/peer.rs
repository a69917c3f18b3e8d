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

use async_trait::async_trait;
use bytes::Bytes;
use shoal_common::error::Result;

/// Picks the owner peer for a key.
pub trait PeerPicker: Send + Sync + 'static {
    /// The client handle for the remote owner of `key`, or `None` when the
    /// key is owned locally or no remote peer is available. On `None` the
    /// caller falls back to its source loader.
    fn pick(&self, key: &str) -> Option<Arc<dyn PeerGetter>>;
}

/// A client handle bound to one remote peer.
#[async_trait]
pub trait PeerGetter: Send + Sync + 'static {
    /// Fetch the raw value for `(group, key)` from the peer.
    ///
    /// Implementations own their deadlines: on timeout they must return an
    /// error so coalesced waiters can drain. Success with an empty payload
    /// is legitimate only where the empty value itself is.
    async fn get(&self, group: &str, key: &str) -> Result<Bytes>;
}

/// Builds the client handle for a peer id.
///
/// This is the seam to the transport: the pool stays transport-agnostic and
/// asks the connector for one handle per peer whenever the peer set is
/// replaced.
pub trait PeerConnector: Send + Sync + 'static {
    fn connect(&self, peer: &str) -> Arc<dyn PeerGetter>;
}
