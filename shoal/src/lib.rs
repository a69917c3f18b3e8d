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

#![warn(missing_docs)]

//! A distributed, in-process read-through cache.
//!
//! Callers register named cache [`Group`]s, each with a byte-bounded
//! capacity and a source [`Loader`]. Reads are served from a local LRU
//! cache; misses are routed across a fixed cluster of peers by consistent
//! hashing, duplicate concurrent loads are coalesced, and the source loader
//! is the fallback when the key is owned locally or the peer hop fails.

use shoal_cluster as cluster;
use shoal_common as common;
use shoal_memory as memory;

mod builder;
mod group;
mod registry;

pub mod prelude;
pub use prelude::*;
