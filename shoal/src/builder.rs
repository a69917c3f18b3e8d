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

use crate::{
    group::{Group, Loader},
    memory::{EvictionListener, MemCache},
    registry::{self, Registry},
};

/// Cache group builder.
pub struct GroupBuilder {
    name: String,
    capacity: usize,
    listener: Option<Arc<dyn EvictionListener>>,
}

impl GroupBuilder {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capacity: 0,
            listener: None,
        }
    }

    /// Set the local cache budget in bytes.
    ///
    /// Zero (the default) disables capacity-based eviction.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Install an eviction listener on the local cache.
    ///
    /// Default: no eviction listener installed.
    pub fn with_eviction_listener(mut self, listener: Arc<dyn EvictionListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Build the group and register it in the process-wide registry.
    pub fn build<L>(self, loader: L) -> Group
    where
        L: Loader,
    {
        self.build_in(registry::global(), loader)
    }

    /// Build the group and register it in the given registry.
    pub fn build_in<L>(self, registry: &Registry, loader: L) -> Group
    where
        L: Loader,
    {
        let mut cache = MemCache::new(self.capacity);
        if let Some(listener) = self.listener {
            cache = cache.with_eviction_listener(listener);
        }

        let group = Group::new(self.name, Arc::new(loader), cache);
        registry.register(group.clone());
        group
    }
}
