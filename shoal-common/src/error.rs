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

use std::{
    borrow::Cow,
    fmt::{Debug, Display},
    sync::Arc,
};

/// The failure classes shoal reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid caller input, e.g. an empty key.
    Input,
    /// Invalid configuration.
    Config,
    /// The source loader failed. The loader's own error is the cause.
    Source,
    /// The peer hop failed (transport error, non-success status, body read failure).
    Peer,
    /// A latch or channel closed before delivering a result.
    ChannelClosed,
}

impl ErrorKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Config => "config",
            Self::Source => "source",
            Self::Peer => "peer",
            Self::ChannelClosed => "channel closed",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error type shared across the shoal crates.
///
/// An error is a failure class, a message, and optionally the underlying
/// failure that produced it. Cloning is cheap because the cause is shared,
/// which lets a single failed load fan out to every caller coalesced on it.
#[derive(Clone)]
pub struct Error {
    kind: ErrorKind,
    message: Cow<'static, str>,
    cause: Option<Arc<anyhow::Error>>,
}

impl Error {
    /// An error with no underlying cause.
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    /// An error wrapping the failure that produced it.
    pub fn caused_by(
        kind: ErrorKind,
        message: impl Into<Cow<'static, str>>,
        cause: impl Into<anyhow::Error>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: Some(Arc::new(cause.into())),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Downcast the cause to a concrete error type, if there is one.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.cause.as_deref().and_then(|cause| cause.downcast_ref())
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(cause) = &self.cause {
            write!(f, ": {cause}")?;
        }
        Ok(())
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut de = f.debug_struct("Error");
        de.field("kind", &self.kind);
        de.field("message", &self.message);
        if let Some(cause) = &self.cause {
            de.field("cause", cause);
        }
        de.finish()
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause.as_deref().map(AsRef::as_ref)
    }
}

/// Result type for shoal.
pub type Result<T> = std::result::Result<T, Error>;
