// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The serialization engine and the top-level [`Serializer`].
//!
//! An [`Engine`] owns the sealed configuration, the type-config registry,
//! the formatter memo and the compiled-plan cache. A [`Serializer`] wraps an
//! engine together with the per-invocation scratch state (written schemata,
//! reference tables, wire type tables) that must never leak into global
//! state.
//!
//! A serializer is not meant to be shared across concurrent invocations;
//! callers wanting parallelism instantiate one per worker.

use crate::config::SerializerConfig;
use crate::error::{Result, StrataError};
use crate::fmt::{Formattable, Formatter, ForwardFormatter, ObjectFormatter};
use crate::io::{Reader, Writer};
use crate::reflect::Reflect;
use crate::registry::{self, DefaultBinder, SelectedMember, TypeBinder, TypeConfig, TypeConfigRegistry};
use crate::schema::VersionTolerantFormatter;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Per-invocation write state.
#[derive(Default)]
pub(crate) struct WriteScratch {
    /// Types whose schema was already emitted into this graph.
    pub written_schemata: HashSet<TypeId>,
    /// Allocation address to sequential object id.
    pub ref_ids: HashMap<usize, u32>,
    /// Wire type table: first occurrence writes the name, repeats the index.
    pub type_ids: HashMap<TypeId, u32>,
}

impl WriteScratch {
    fn begin(&mut self, persist_types: bool) {
        self.written_schemata.clear();
        self.ref_ids.clear();
        if !persist_types {
            self.type_ids.clear();
        }
    }
}

/// Per-invocation read state.
#[derive(Default)]
pub(crate) struct ReadScratch {
    /// Read plans learned from schemata met in this stream, by type.
    learned: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    /// Objects decoded so far, addressable by back-reference id.
    pub refs: Vec<Box<dyn Any>>,
    /// Wire type table mirror of the write side.
    pub type_names: Vec<Arc<str>>,
}

impl ReadScratch {
    fn begin(&mut self, persist_types: bool) {
        self.learned.clear();
        self.refs.clear();
        if !persist_types {
            self.type_names.clear();
        }
    }

    pub(crate) fn learned_plan<P: 'static>(&self, id: TypeId) -> Option<Arc<P>> {
        self.learned
            .get(&id)
            .and_then(|entry| entry.downcast_ref::<Arc<P>>())
            .cloned()
    }

    pub(crate) fn remember_plan<P: Send + Sync + 'static>(&mut self, id: TypeId, plan: Arc<P>) {
        self.learned.insert(id, Box::new(plan));
    }
}

/// Write-side context handed to every formatter.
pub struct WriteCtx<'a> {
    pub(crate) engine: &'a Engine,
    pub out: Writer<'a>,
    pub(crate) scratch: &'a mut WriteScratch,
}

impl WriteCtx<'_> {
    /// The engine this invocation runs under.
    pub fn engine(&self) -> &Engine {
        self.engine
    }
}

/// Read-side context handed to every formatter.
pub struct ReadCtx<'a> {
    pub(crate) engine: &'a Engine,
    pub input: Reader<'a>,
    pub(crate) scratch: &'a mut ReadScratch,
}

impl ReadCtx<'_> {
    /// The engine this invocation runs under.
    pub fn engine(&self) -> &Engine {
        self.engine
    }
}

/// The engine: sealed configuration plus lazily populated registries.
pub struct Engine {
    config: SerializerConfig,
    type_configs: TypeConfigRegistry,
    /// TypeId to boxed `Arc<ForwardFormatter<T>>`.
    formatters: DashMap<TypeId, Box<dyn Any + Send + Sync>>,
    /// (type, schema structural hash) to boxed `Arc<SchemaReadPlan<T>>`.
    read_plans: Mutex<HashMap<(TypeId, u64), Box<dyn Any + Send + Sync>>>,
    default_binder: DefaultBinder,
    sealed: AtomicBool,
    checksum: OnceLock<u32>,
}

impl Engine {
    pub(crate) fn new(config: SerializerConfig) -> Self {
        Self {
            config,
            type_configs: TypeConfigRegistry::default(),
            formatters: DashMap::new(),
            read_plans: Mutex::new(HashMap::new()),
            default_binder: DefaultBinder::new(),
            sealed: AtomicBool::new(false),
            checksum: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &SerializerConfig {
        &self.config
    }

    pub(crate) fn type_configs(&self) -> &TypeConfigRegistry {
        &self.type_configs
    }

    pub(crate) fn known_types(&self) -> &[crate::config::KnownType] {
        &self.config.known
    }

    pub(crate) fn binder(&self) -> &dyn TypeBinder {
        match &self.config.type_binder {
            Some(binder) => binder.as_ref(),
            None => &self.default_binder,
        }
    }

    pub(crate) fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::SeqCst)
    }

    /// One-way latch flipped by the first serialize/deserialize.
    pub(crate) fn seal(&self) {
        if self.sealed.swap(true, Ordering::SeqCst) {
            return;
        }
        let checksum = self.protocol_checksum();
        log::debug!(
            "[strata] engine sealed: {} known types, protocol checksum {:#010x}",
            self.config.known.len(),
            checksum
        );
    }

    /// FNV-1a fingerprint of the known-types table and its member names.
    pub(crate) fn protocol_checksum(&self) -> u32 {
        *self.checksum.get_or_init(|| {
            const OFFSET: u32 = 0x811c_9dc5;
            const PRIME: u32 = 0x0100_0193;
            let mut hash = OFFSET;
            let mut feed = |bytes: &[u8]| {
                for b in bytes {
                    hash = (hash ^ u32::from(*b)).wrapping_mul(PRIME);
                }
            };
            for known in &self.config.known {
                feed(known.name.as_bytes());
                feed(&[0]);
                for member in &known.member_names {
                    feed(member.as_bytes());
                    feed(&[0]);
                }
            }
            hash
        })
    }

    /// Resolve the formatter for a declared type, memoized by `TypeId`.
    ///
    /// Construction is two-phase: a forwarder placeholder is published under
    /// the key before the real formatter is built, so formatters of
    /// self-referential types resolve to themselves.
    pub fn formatter<T: Formattable>(&self) -> Result<Arc<dyn Formatter<T>>> {
        let id = TypeId::of::<T>();
        if let Some(entry) = self.formatters.get(&id) {
            let fwd = entry
                .downcast_ref::<Arc<ForwardFormatter<T>>>()
                .ok_or_else(|| StrataError::ConfigurationConflict {
                    reason: "formatter slot holds a mismatched type".into(),
                })?
                .clone();
            return Ok(fwd);
        }
        let fwd = Arc::new(ForwardFormatter::<T>::new());
        self.formatters.insert(id, Box::new(fwd.clone()));
        match self.build_formatter::<T>() {
            Ok(inner) => {
                fwd.install(inner);
                Ok(fwd)
            }
            Err(e) => {
                // Leave no half-built slot behind.
                self.formatters.remove(&id);
                Err(e)
            }
        }
    }

    fn build_formatter<T: Formattable>(&self) -> Result<Arc<dyn Formatter<T>>> {
        let id = TypeId::of::<T>();
        for resolver in &self.config.resolvers {
            if let Some(boxed) = resolver(self, id) {
                log::debug!(
                    "[strata] user resolver supplied formatter for {}",
                    std::any::type_name::<T>()
                );
                return boxed
                    .downcast_ref::<Arc<dyn Formatter<T>>>()
                    .cloned()
                    .ok_or_else(|| StrataError::ConfigurationConflict {
                        reason: format!(
                            "resolver returned a mismatched formatter for {}",
                            std::any::type_name::<T>()
                        ),
                    });
            }
        }
        if let Some(explicit) = self.config.explicit.get(&id) {
            if !explicit.reinterpret || self.config.use_reinterpret_formatter {
                return explicit
                    .fmt
                    .downcast_ref::<Arc<dyn Formatter<T>>>()
                    .cloned()
                    .ok_or_else(|| StrataError::ConfigurationConflict {
                        reason: format!(
                            "explicit formatter registered under a mismatched type for {}",
                            std::any::type_name::<T>()
                        ),
                    });
            }
        }
        T::formatter(self)
    }

    /// Formatter for a member's declared type, honoring a per-member
    /// explicit override from the owner's [`TypeConfig`].
    pub(crate) fn member_formatter<F: Formattable>(
        &self,
        owner: TypeId,
        member: &str,
    ) -> Result<Arc<dyn Formatter<F>>> {
        if let Some(cfg) = self.type_configs.raw(owner) {
            let guard = cfg.read();
            if let Some(boxed) = cfg_member_formatter(&guard, member) {
                return boxed
                    .downcast_ref::<Arc<dyn Formatter<F>>>()
                    .cloned()
                    .ok_or_else(|| StrataError::ConfigurationConflict {
                        reason: format!("member formatter for '{}' has a mismatched type", member),
                    });
            }
        }
        self.formatter::<F>()
    }

    /// Built-in construction path for reflected types: version-tolerant when
    /// enabled, the plain object formatter otherwise.
    pub fn reflected_formatter<T: Reflect>(&self) -> Result<Arc<dyn Formatter<T>>> {
        match self.config.version_tolerance {
            crate::config::VersionTolerance::AutomaticEmbedded => {
                Ok(Arc::new(VersionTolerantFormatter::<T>::new(self)?))
            }
            crate::config::VersionTolerance::Disabled => {
                Ok(Arc::new(ObjectFormatter::<T>::new(self)?))
            }
        }
    }

    /// Usage lookup plus member selection for a reflected type. Fires the
    /// first-touch callback when this creates the type's config.
    pub(crate) fn selected_members<T: Reflect>(&self) -> Vec<SelectedMember<T>> {
        let cfg = self
            .type_configs
            .usage_lookup::<T>(self.config.on_new_type.as_ref());
        if self.config.type_binder.is_none() {
            self.default_binder.bind(TypeId::of::<T>(), T::type_name());
        }
        let guard = cfg.read();
        registry::select_members::<T>(&guard, &self.config)
    }

    pub(crate) fn cached_read_plan<P: Send + Sync + 'static>(
        &self,
        key: (TypeId, u64),
    ) -> Option<Arc<P>> {
        self.read_plans
            .lock()
            .get(&key)
            .and_then(|entry| entry.downcast_ref::<Arc<P>>())
            .cloned()
    }

    pub(crate) fn store_read_plan<P: Send + Sync + 'static>(&self, key: (TypeId, u64), plan: Arc<P>) {
        self.read_plans.lock().insert(key, Box::new(plan));
    }
}

/// Borrow helper: fetch a member's explicit formatter out of a config guard.
fn cfg_member_formatter<'a>(
    cfg: &'a TypeConfig,
    member: &str,
) -> Option<&'a (dyn Any + Send + Sync)> {
    cfg.member_override(member)
        .and_then(|o| o.formatter.as_deref())
}

/// The top-level serializer: an engine plus per-invocation scratch state.
///
/// Not meant to be shared across concurrent invocations; instantiate one per
/// worker.
pub struct Serializer {
    engine: Engine,
    write_scratch: WriteScratch,
    read_scratch: ReadScratch,
}

impl Serializer {
    pub fn new(config: SerializerConfig) -> Self {
        Self {
            engine: Engine::new(config),
            write_scratch: WriteScratch::default(),
            read_scratch: ReadScratch::default(),
        }
    }

    pub fn config(&self) -> &SerializerConfig {
        self.engine.config()
    }

    /// Mutate the configuration of a type before first use. Does not fire
    /// the first-touch callback.
    ///
    /// Fails with `ConfigurationLocked` once the engine is sealed.
    pub fn config_type<T: Reflect>(
        &self,
        configure: impl FnOnce(&mut TypeConfig),
    ) -> Result<()> {
        if self.engine.is_sealed() {
            return Err(StrataError::ConfigurationLocked {
                reason: format!(
                    "cannot configure '{}' after the first serialize/deserialize",
                    T::type_name()
                ),
            });
        }
        let cfg = self.engine.type_configs().config_lookup::<T>();
        configure(&mut *cfg.write());
        Ok(())
    }

    /// Serialize `value`, appending to `buffer`. Returns the number of bytes
    /// written.
    pub fn serialize<T: Formattable>(&mut self, value: &T, buffer: &mut Vec<u8>) -> Result<usize> {
        self.engine.seal();
        let start = buffer.len();
        self.write_scratch
            .begin(self.engine.config().persist_type_cache);
        let fmt = self.engine.formatter::<T>()?;
        let mut ctx = WriteCtx {
            engine: &self.engine,
            out: Writer::new(buffer),
            scratch: &mut self.write_scratch,
        };
        if ctx.engine.config().embed_checksum {
            let checksum = ctx.engine.protocol_checksum();
            ctx.out.write_u32_le(checksum);
        }
        fmt.serialize(&mut ctx, value)?;
        let end = ctx.out.offset();
        Ok(end - start)
    }

    /// Deserialize from `buffer` at `offset`, overwriting `target` in place
    /// and advancing `offset` by the bytes consumed.
    pub fn deserialize_into<T: Formattable>(
        &mut self,
        buffer: &[u8],
        offset: &mut usize,
        target: &mut T,
    ) -> Result<()> {
        self.engine.seal();
        self.read_scratch
            .begin(self.engine.config().persist_type_cache);
        let fmt = self.engine.formatter::<T>()?;
        let mut ctx = ReadCtx {
            engine: &self.engine,
            input: Reader::new(buffer, *offset),
            scratch: &mut self.read_scratch,
        };
        if ctx.engine.config().embed_checksum {
            let found = ctx.input.read_u32_le()?;
            let expected = ctx.engine.protocol_checksum();
            if found != expected {
                return Err(StrataError::ChecksumMismatch { expected, found });
            }
        }
        fmt.deserialize(&mut ctx, target)?;
        *offset = ctx.input.offset();
        Ok(())
    }

    /// Deserialize into a fresh default value.
    pub fn deserialize<T: Formattable + Default>(
        &mut self,
        buffer: &[u8],
        offset: &mut usize,
    ) -> Result<T> {
        let mut value = T::default();
        self.deserialize_into(buffer, offset, &mut value)?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_is_one_way() {
        let engine = Engine::new(SerializerConfig::default());
        assert!(!engine.is_sealed());
        engine.seal();
        assert!(engine.is_sealed());
        engine.seal();
        assert!(engine.is_sealed());
    }

    #[test]
    fn test_protocol_checksum_is_stable_and_sensitive() {
        let engine = Engine::new(SerializerConfig::default());
        let empty = engine.protocol_checksum();
        assert_eq!(empty, engine.protocol_checksum());

        #[derive(Default)]
        struct Known {
            a: u32,
        }
        impl Reflect for Known {
            fn type_name() -> &'static str {
                "Known"
            }
            fn members() -> Vec<crate::reflect::MemberDescriptor<Self>> {
                vec![crate::reflect::MemberDescriptor::field(
                    "a",
                    |s: &Known| &s.a,
                    |s: &mut Known| &mut s.a,
                )]
            }
        }

        let mut config = SerializerConfig::default();
        config.add_known_type::<Known>();
        let engine = Engine::new(config);
        assert_ne!(engine.protocol_checksum(), empty);
    }

    #[test]
    fn test_formatter_memoized_per_type() {
        let engine = Engine::new(SerializerConfig::default());
        let a = engine.formatter::<u32>().expect("resolve u32");
        let b = engine.formatter::<u32>().expect("resolve u32 again");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_failed_construction_leaves_no_slot() {
        let mut config = SerializerConfig::default();
        config.add_resolver(Arc::new(|_, id| {
            // Claim u64 but hand back a formatter for the wrong type.
            (id == TypeId::of::<u64>()).then(|| {
                let wrong: Arc<dyn Formatter<u32>> =
                    Arc::new(crate::fmt::ReinterpretFormatter::<u32>::new());
                Box::new(wrong) as Box<dyn Any + Send + Sync>
            })
        }));
        let engine = Engine::new(config);
        assert!(engine.formatter::<u64>().is_err());
        // The slot must have been cleaned up; a second attempt fails the
        // same way instead of hitting a dangling forwarder.
        assert!(engine.formatter::<u64>().is_err());
    }
}
