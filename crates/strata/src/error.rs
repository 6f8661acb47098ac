// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for serialization, deserialization and configuration.

use std::fmt;

/// Errors surfaced by the top-level `Serialize`/`Deserialize` operations and
/// by configuration calls.
///
/// The buffer's post-failure offset is not defined; partial output may remain
/// in the buffer. No internal recovery is attempted.
#[derive(Debug, Clone)]
pub enum StrataError {
    /// Double-assignment of a single-assignment hook.
    ConfigurationConflict { reason: String },
    /// Configuration mutation attempted after the engine was sealed by the
    /// first `serialize`/`deserialize` call.
    ConfigurationLocked { reason: String },
    /// A type outside the known-types table while sealed mode is active, or
    /// a persisted type name the binder cannot resolve.
    UnknownType { name: String },
    /// A declared length exceeds its configured limit, or a negative or
    /// malformed length was read.
    MaliciousInput {
        what: &'static str,
        declared: u64,
        limit: u64,
    },
    /// A non-skippable member could not be decoded against the current type.
    SchemaMismatch {
        member: String,
        type_name: String,
        reason: String,
    },
    /// A delegate was encountered under a `DelegateSerialization` mode that
    /// forbids it.
    DelegateNotAllowed { reason: String },
    /// `embed_checksum` is enabled and the stream prefix does not match the
    /// local protocol checksum.
    ChecksumMismatch { expected: u32, found: u32 },
    /// Read past the end of the provided buffer.
    EndOfStream { offset: usize, needed: usize },
}

impl fmt::Display for StrataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrataError::ConfigurationConflict { reason } => {
                write!(f, "configuration conflict: {}", reason)
            }
            StrataError::ConfigurationLocked { reason } => {
                write!(f, "configuration locked: {}", reason)
            }
            StrataError::UnknownType { name } => write!(f, "unknown type: {}", name),
            StrataError::MaliciousInput {
                what,
                declared,
                limit,
            } => write!(
                f,
                "malicious input: {} declares length {} (limit {})",
                what, declared, limit
            ),
            StrataError::SchemaMismatch {
                member,
                type_name,
                reason,
            } => write!(
                f,
                "schema mismatch on member '{}' of type '{}': {}",
                member, type_name, reason
            ),
            StrataError::DelegateNotAllowed { reason } => {
                write!(f, "delegate not allowed: {}", reason)
            }
            StrataError::ChecksumMismatch { expected, found } => write!(
                f,
                "checksum mismatch: expected {:#010x}, found {:#010x}",
                expected, found
            ),
            StrataError::EndOfStream { offset, needed } => write!(
                f,
                "end of stream at offset {}: {} more bytes needed",
                offset, needed
            ),
        }
    }
}

impl std::error::Error for StrataError {}

pub type Result<T> = core::result::Result<T, StrataError>;
