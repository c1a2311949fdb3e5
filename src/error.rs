// Copyright 2024 Saptak Santra
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

//! Error types.
//!
//! Every "not present" outcome (a missing component, an absent resource, a
//! ring index out of bounds) is a plain `bool`/`Option`, never a variant
//! here. This enum only carries the two cases a caller actually has to
//! handle: a rejected restore and a codec failure.

use std::fmt;

/// Reasons a restore can be rejected. Checked, in order, before any live
/// state is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreError {
    /// The save's system-callback fingerprint does not match the current
    /// set of registered callbacks.
    IncompatibleCallbacks,
    /// The save's part fingerprint (components + tags) does not match.
    IncompatibleParts,
    /// The save's resource fingerprint does not match.
    IncompatibleResources,
    /// The save was written by a newer format version than this build
    /// understands.
    IncompatibleVersion,
}

impl fmt::Display for RestoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestoreError::IncompatibleCallbacks => {
                write!(f, "save's system callbacks do not match the running program")
            }
            RestoreError::IncompatibleParts => {
                write!(f, "save's components/tags do not match the running program")
            }
            RestoreError::IncompatibleResources => {
                write!(f, "save's resources do not match the running program")
            }
            RestoreError::IncompatibleVersion => {
                write!(f, "save was written by a newer, incompatible format version")
            }
        }
    }
}

/// The crate's only user-visible error type.
#[derive(Debug, Clone)]
pub enum EcsError {
    /// A save failed one of its compatibility checks before any state was
    /// replaced; the live world is untouched.
    Restore(RestoreError),
    /// The underlying codec could not decode the bytes at all.
    Decode(String),
}

impl fmt::Display for EcsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcsError::Restore(inner) => write!(f, "restore rejected: {inner}"),
            EcsError::Decode(msg) => write!(f, "decode failed: {msg}"),
        }
    }
}

impl std::error::Error for EcsError {}

impl From<RestoreError> for EcsError {
    fn from(err: RestoreError) -> Self {
        EcsError::Restore(err)
    }
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, EcsError>;
