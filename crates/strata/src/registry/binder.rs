// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type identity: binder trait and the wire codec for type references.
//!
//! A type reference is encoded one of three ways:
//! - **known-types index** when the known-types table is non-empty (with a
//!   `len` escape followed by a name when the world is not sealed);
//! - **back-reference** into the per-invocation type table;
//! - **length-prefixed name**, on the first occurrence of a type.

use crate::engine::{ReadCtx, WriteCtx};
use crate::error::{Result, StrataError};
use crate::reflect::Reflect;
use dashmap::DashMap;
use std::any::TypeId;
use std::sync::Arc;

/// Bidirectional map between a runtime type and its persistent string name.
///
/// The engine maintains a [`DefaultBinder`] populated from reflected type
/// names; installing a custom binder through
/// [`SerializerConfig::type_binder`](crate::SerializerConfig::type_binder)
/// replaces name resolution on both ends.
pub trait TypeBinder: Send + Sync {
    /// The persistent name a type serializes under, if bound.
    fn persistent_name(&self, id: TypeId) -> Option<Arc<str>>;

    /// Resolve a persisted name back to a local type.
    fn resolve(&self, name: &str) -> Option<TypeId>;
}

/// Map-backed binder, lazily populated from reflected type names.
#[derive(Default)]
pub struct DefaultBinder {
    by_id: DashMap<TypeId, Arc<str>>,
    by_name: DashMap<Arc<str>, TypeId>,
}

impl DefaultBinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a type to its persistent name.
    pub fn bind(&self, id: TypeId, name: &str) {
        if self.by_id.contains_key(&id) {
            return;
        }
        let name: Arc<str> = Arc::from(name);
        self.by_id.insert(id, name.clone());
        self.by_name.insert(name, id);
    }
}

impl TypeBinder for DefaultBinder {
    fn persistent_name(&self, id: TypeId) -> Option<Arc<str>> {
        self.by_id.get(&id).map(|entry| entry.clone())
    }

    fn resolve(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).map(|entry| *entry)
    }
}

fn wire_name<T: Reflect>(ctx_binder: &dyn TypeBinder) -> Arc<str> {
    ctx_binder
        .persistent_name(TypeId::of::<T>())
        .unwrap_or_else(|| Arc::from(T::type_name()))
}

/// Encode the identity of `T` at the current write position.
pub(crate) fn write_type<T: Reflect>(ctx: &mut WriteCtx<'_>) -> Result<()> {
    let id = TypeId::of::<T>();
    let known = ctx.engine.known_types();
    if !known.is_empty() {
        if let Some(idx) = known.iter().position(|k| k.id == id) {
            ctx.out.write_var_u64(idx as u64);
            return Ok(());
        }
        if ctx.engine.config().seal_types_when_using_known_types {
            return Err(StrataError::UnknownType {
                name: T::type_name().into(),
            });
        }
        // Escape index == table length, followed by the name.
        log::debug!(
            "[strata] type '{}' outside the known-types table, escaping to name encoding",
            T::type_name()
        );
        ctx.out.write_var_u64(known.len() as u64);
        let name = wire_name::<T>(ctx.engine.binder());
        ctx.out.write_str(&name);
        return Ok(());
    }

    if let Some(&idx) = ctx.scratch.type_ids.get(&id) {
        ctx.out.write_var_u64(u64::from(idx) + 1);
    } else {
        let idx = ctx.scratch.type_ids.len() as u32;
        ctx.scratch.type_ids.insert(id, idx);
        ctx.out.write_var_u64(0);
        let name = wire_name::<T>(ctx.engine.binder());
        ctx.out.write_str(&name);
    }
    Ok(())
}

fn verify_name<T: Reflect>(ctx: &ReadCtx<'_>, name: &str) -> Result<()> {
    if name == T::type_name() {
        return Ok(());
    }
    if ctx.engine.binder().resolve(name) == Some(TypeId::of::<T>()) {
        return Ok(());
    }
    Err(StrataError::UnknownType { name: name.into() })
}

/// Decode a type reference and check it resolves to `T`.
pub(crate) fn read_type<T: Reflect>(ctx: &mut ReadCtx<'_>) -> Result<()> {
    let id = TypeId::of::<T>();
    let known_len = ctx.engine.known_types().len();
    if known_len > 0 {
        let idx = ctx.input.read_var_u64()?;
        if (idx as usize) < known_len {
            let entry = &ctx.engine.known_types()[idx as usize];
            if entry.id == id {
                return Ok(());
            }
            return Err(StrataError::UnknownType {
                name: entry.name.into(),
            });
        }
        if idx as usize == known_len {
            let max = ctx.engine.config().limits.max_string_len;
            let name = ctx.input.read_str_bounded(max)?;
            return verify_name::<T>(ctx, &name);
        }
        return Err(StrataError::MaliciousInput {
            what: "known-type index",
            declared: idx,
            limit: known_len as u64,
        });
    }

    let tag = ctx.input.read_var_u32()?;
    if tag == 0 {
        let max = ctx.engine.config().limits.max_string_len;
        let name = ctx.input.read_str_bounded(max)?;
        verify_name::<T>(ctx, &name)?;
        ctx.scratch.type_names.push(Arc::from(name.as_str()));
        Ok(())
    } else {
        let idx = (tag - 1) as usize;
        let table_len = ctx.scratch.type_names.len() as u64;
        let name = ctx
            .scratch
            .type_names
            .get(idx)
            .cloned()
            .ok_or(StrataError::MaliciousInput {
                what: "type back-reference",
                declared: u64::from(tag),
                limit: table_len,
            })?;
        verify_name::<T>(ctx, &name)
    }
}
