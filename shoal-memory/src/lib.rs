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

//! The local in-memory side of shoal: a byte-bounded LRU engine and the
//! concurrent shell that guards it.

mod cache;
mod listener;
mod lru;
mod metrics;

pub use cache::MemCache;
pub use listener::EvictionListener;
pub use lru::Lru;
pub use metrics::Metrics;
