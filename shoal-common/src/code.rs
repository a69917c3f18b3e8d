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

use std::{fmt::Debug, str::Utf8Error};

use bytes::Bytes;

/// An immutable, length-known byte payload.
///
/// `ByteView` is the unit of exchange between the cache, remote peers and
/// callers. Cloning is O(1) and shares the underlying buffer. The buffer
/// can never be mutated through a view, so the cache can hand the same view
/// to any number of callers without synchronization, and nothing a caller
/// does to its copy can corrupt cached state.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ByteView {
    bytes: Bytes,
}

impl ByteView {
    /// Build a view by copying the given slice.
    ///
    /// The copy keeps the cache from aliasing caller-owned memory.
    pub fn copy_from_slice(data: &[u8]) -> Self {
        Self {
            bytes: Bytes::copy_from_slice(data),
        }
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Read-only access to the payload.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Defensive copy of the payload.
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    /// The shared buffer behind the view.
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    /// Textual rendering of the payload.
    ///
    /// It is on the caller to ensure the payload is valid UTF-8.
    pub fn as_utf8(&self) -> Result<&str, Utf8Error> {
        std::str::from_utf8(&self.bytes)
    }
}

impl Debug for ByteView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteView").field("len", &self.len()).finish()
    }
}

impl AsRef<[u8]> for ByteView {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl From<Bytes> for ByteView {
    fn from(bytes: Bytes) -> Self {
        Self { bytes }
    }
}

impl From<Vec<u8>> for ByteView {
    fn from(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Bytes::from(bytes),
        }
    }
}

impl From<String> for ByteView {
    fn from(s: String) -> Self {
        Self {
            bytes: Bytes::from(s.into_bytes()),
        }
    }
}

impl From<&str> for ByteView {
    fn from(s: &str) -> Self {
        Self::copy_from_slice(s.as_bytes())
    }
}
