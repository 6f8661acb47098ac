// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Version-tolerant object formatter.
//!
//! Each member payload is prefixed by its encoded byte count as a signed
//! 16-bit little-endian integer, reserved before the payload and patched in
//! afterwards. The prefix lets a reader with a differently-shaped type skip
//! payloads it cannot interpret; the fixed width is what makes retroactive
//! patching possible. Individual members are therefore bounded to 32 767
//! encoded bytes.
//!
//! The schema itself is emitted exactly once per object graph per type,
//! keyed by the invocation's written-schemata set; the reader mirrors that
//! discipline and compiles a read plan the first time it meets each type in
//! a stream. Plans for schemas seen in earlier invocations come from a
//! structural-hash cache.

use super::{codec, Schema};
use crate::engine::{Engine, ReadCtx, WriteCtx};
use crate::error::{Result, StrataError};
use crate::fmt::Formatter;
use crate::reflect::{BoundMember, Reflect};
use crate::registry::SelectedMember;
use std::any::TypeId;
use std::sync::Arc;

/// One step of a compiled read plan.
enum ReadStep<T> {
    /// Advance past the member's payload without interpreting it.
    Skip,
    Member {
        name: Arc<str>,
        bound: BoundMember<T>,
    },
}

pub(crate) struct SchemaReadPlan<T> {
    steps: Vec<ReadStep<T>>,
}

/// Formatter for `T` under automatic embedded version tolerance.
pub struct VersionTolerantFormatter<T: Reflect> {
    members: Vec<SelectedMember<T>>,
    write_plan: Vec<BoundMember<T>>,
    schema: Schema,
}

impl<T: Reflect> VersionTolerantFormatter<T> {
    pub(crate) fn new(engine: &Engine) -> Result<Self> {
        let owner = TypeId::of::<T>();
        let members = engine.selected_members::<T>();
        let write_plan = members
            .iter()
            .map(|m| m.desc.bind(engine, owner))
            .collect::<Result<Vec<_>>>()?;
        let schema = Schema::current(T::type_name(), &members);
        Ok(Self {
            members,
            write_plan,
            schema,
        })
    }

    /// Compile (or fetch from the engine cache) the read plan for a schema
    /// received from a stream.
    fn read_plan(&self, engine: &Engine, schema: &Schema) -> Result<Arc<SchemaReadPlan<T>>> {
        let key = (TypeId::of::<T>(), schema.structural_hash());
        if let Some(plan) = engine.cached_read_plan::<SchemaReadPlan<T>>(key) {
            return Ok(plan);
        }
        let owner = TypeId::of::<T>();
        let steps = schema
            .members
            .iter()
            .map(|sm| match sm.member {
                None => Ok(ReadStep::Skip),
                Some(idx) => self.members[idx].desc.bind(engine, owner).map(|bound| {
                    ReadStep::Member {
                        name: sm.name.clone(),
                        bound,
                    }
                }),
            })
            .collect::<Result<Vec<_>>>()?;
        let plan = Arc::new(SchemaReadPlan { steps });
        engine.store_read_plan(key, plan.clone());
        Ok(plan)
    }
}

impl<T: Reflect> Formatter<T> for VersionTolerantFormatter<T> {
    fn serialize(&self, ctx: &mut WriteCtx<'_>, value: &T) -> Result<()> {
        let id = TypeId::of::<T>();
        if ctx.scratch.written_schemata.insert(id) {
            codec::write_schema::<T>(ctx, &self.schema)?;
        }
        for (i, bound) in self.write_plan.iter().enumerate() {
            let prefix_pos = ctx.out.reserve_i16();
            (bound.write)(ctx, value)?;
            let size = ctx.out.offset() - prefix_pos - 2;
            if size > i16::MAX as usize {
                return Err(StrataError::SchemaMismatch {
                    member: self.schema.members[i].name.to_string(),
                    type_name: T::type_name().into(),
                    reason: format!(
                        "encoded member size {} exceeds the 16-bit prefix",
                        size
                    ),
                });
            }
            ctx.out.patch_i16_le(prefix_pos, size as i16);
        }
        Ok(())
    }

    fn deserialize(&self, ctx: &mut ReadCtx<'_>, into: &mut T) -> Result<()> {
        let id = TypeId::of::<T>();
        let plan = match ctx.scratch.learned_plan::<SchemaReadPlan<T>>(id) {
            Some(plan) => plan,
            None => {
                let schema = codec::read_schema::<T>(ctx, &self.members)?;
                log::debug!(
                    "[strata] learned schema for '{}': {} members, {} skipped",
                    T::type_name(),
                    schema.members.len(),
                    schema.members.iter().filter(|m| m.is_skip()).count()
                );
                let plan = self.read_plan(ctx.engine, &schema)?;
                ctx.scratch.remember_plan(id, plan.clone());
                plan
            }
        };
        for step in &plan.steps {
            let prefix = ctx.input.read_i16_le()?;
            if prefix < 0 {
                return Err(StrataError::MaliciousInput {
                    what: "member size prefix",
                    declared: prefix.unsigned_abs().into(),
                    limit: i16::MAX as u64,
                });
            }
            let size = prefix as usize;
            match step {
                ReadStep::Skip => ctx.input.skip(size)?,
                ReadStep::Member { name, bound } => {
                    let start = ctx.input.offset();
                    (bound.read)(ctx, into)?;
                    let consumed = ctx.input.offset() - start;
                    if consumed != size {
                        return Err(StrataError::SchemaMismatch {
                            member: name.to_string(),
                            type_name: T::type_name().into(),
                            reason: format!(
                                "member consumed {} bytes but its prefix declared {}",
                                consumed, size
                            ),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}
