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

use shoal_common::code::ByteView;

/// Trait for the customized eviction listener.
pub trait EvictionListener: Send + Sync + 'static {
    /// Called when the engine evicts its least-recently-used entry, after
    /// the entry has been unlinked and accounted out.
    ///
    /// Invoked while the owning cache is locked; the listener must not call
    /// back into it.
    fn on_evict(&self, key: &str, value: &ByteView);
}
