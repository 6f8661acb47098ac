// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Formatters: the encoder/decoder pairs behind every declared type.
//!
//! Resolution order for a declared type, applied by the engine:
//! 1. user resolver callbacks, in insertion order (first hit wins);
//! 2. explicit registrations (including the reinterpret fast path);
//! 3. built-ins by shape - primitives, strings, sequences, sets, mappings,
//!    reference-tracked cells, delegates;
//! 4. the reflective object formatter (or its version-tolerant variant).
//!
//! Formatter construction uses a two-phase publish: a forwarder placeholder
//! is inserted under the type key before the real formatter is built, so a
//! self-referential type resolves to itself instead of recursing forever.

mod collections;
mod delegate;
mod object;
mod primitives;
mod reference;
mod reinterpret;

pub use delegate::Delegate;
pub use object::ObjectFormatter;
pub use reinterpret::{Pod, ReinterpretFormatter};

use crate::engine::{Engine, ReadCtx, WriteCtx};
use crate::error::{Result, StrataError};
use std::sync::{Arc, OnceLock};

/// Encoder/decoder pair for values of type `T`.
///
/// `serialize` appends to the context's buffer; `deserialize` overwrites the
/// target in place, enabling object reuse.
pub trait Formatter<T>: Send + Sync {
    fn serialize(&self, ctx: &mut WriteCtx<'_>, value: &T) -> Result<()>;
    fn deserialize(&self, ctx: &mut ReadCtx<'_>, into: &mut T) -> Result<()>;
}

/// A type the engine can resolve a formatter for.
///
/// Implementations provide the *built-in* construction path; user resolvers
/// and explicit registrations are consulted by the engine first.
pub trait Formattable: Sized + 'static {
    fn formatter(engine: &Engine) -> Result<Arc<dyn Formatter<Self>>>;
}

/// Placeholder published before a formatter finishes construction.
///
/// Members of self-referential types capture the forwarder; its target is
/// installed when construction completes.
pub(crate) struct ForwardFormatter<T> {
    target: OnceLock<Arc<dyn Formatter<T>>>,
}

impl<T: 'static> ForwardFormatter<T> {
    pub fn new() -> Self {
        Self {
            target: OnceLock::new(),
        }
    }

    pub fn install(&self, target: Arc<dyn Formatter<T>>) {
        let _ = self.target.set(target);
    }

    fn resolved(&self) -> Result<&Arc<dyn Formatter<T>>> {
        self.target
            .get()
            .ok_or_else(|| StrataError::ConfigurationConflict {
                reason: "formatter invoked before its construction completed".into(),
            })
    }
}

impl<T: 'static> Formatter<T> for ForwardFormatter<T> {
    fn serialize(&self, ctx: &mut WriteCtx<'_>, value: &T) -> Result<()> {
        self.resolved()?.serialize(ctx, value)
    }

    fn deserialize(&self, ctx: &mut ReadCtx<'_>, into: &mut T) -> Result<()> {
        self.resolved()?.deserialize(ctx, into)
    }
}
