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

//! Key placement across a fixed set of cache peers: the consistent-hash
//! ring, the peer capabilities, and the pool that composes them.

mod peer;
mod pool;
mod ring;

pub use peer::{PeerConnector, PeerGetter, PeerPicker};
pub use pool::{PeerPool, DEFAULT_REPLICAS};
pub use ring::{HashRing, RingHasher};
