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

use std::sync::atomic::AtomicUsize;

/// Plain counters over the cache's life. No exporter is wired up; callers
/// that want them scrape the fields.
#[derive(Debug, Default)]
pub struct Metrics {
    /// get hits
    pub hit: AtomicUsize,
    /// get misses
    pub miss: AtomicUsize,

    /// inserts of new keys
    pub insert: AtomicUsize,
    /// value replacements of resident keys
    pub replace: AtomicUsize,

    /// capacity evictions
    pub evict: AtomicUsize,

    /// source loader invocations
    pub load: AtomicUsize,
    /// remote peer fetch attempts
    pub peer_fetch: AtomicUsize,
}
