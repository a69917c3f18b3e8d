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

use std::sync::OnceLock;

use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::group::Group;

/// A name-to-group lookup table.
///
/// Groups register themselves when built. Lookups take the read lock,
/// registrations the write lock. The library keeps one process-wide
/// instance behind [`global`]; tests and embedders that want isolation can
/// carry their own.
pub struct Registry {
    groups: RwLock<HashMap<String, Group>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            groups: RwLock::new(HashMap::new()),
        }
    }

    /// Register a group under its name. Re-using a name replaces the prior
    /// registration.
    pub fn register(&self, group: Group) {
        let name = group.name().to_owned();
        let replaced = self.groups.write().insert(name.clone(), group);
        if replaced.is_some() {
            tracing::warn!(name = name.as_str(), "cache group registration replaced");
        }
    }

    /// The group registered under `name`, if any.
    pub fn get(&self, name: &str) -> Option<Group> {
        self.groups.read().get(name).cloned()
    }

    /// Drop the registration under `name` and return it.
    pub fn remove(&self, name: &str) -> Option<Group> {
        self.groups.write().remove(name)
    }
}

/// The process-wide registry used by [`GroupBuilder::build`](crate::GroupBuilder::build).
pub fn global() -> &'static Registry {
    static GLOBAL: OnceLock<Registry> = OnceLock::new();
    GLOBAL.get_or_init(Registry::new)
}

/// Look up a group in the process-wide registry.
pub fn group(name: &str) -> Option<Group> {
    global().get(name)
}
