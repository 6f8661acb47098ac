// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire codec for [`Schema`] values.
//!
//! Layout: the target type (known-types index, back-reference or name),
//! the member count as a varuint, then one length-prefixed persistent name
//! per member. Member types and flags are never emitted; skippability relies
//! entirely on the per-member byte-count prefixes of the payload.

use super::{Schema, SchemaMember};
use crate::engine::{ReadCtx, WriteCtx};
use crate::error::{Result, StrataError};
use crate::reflect::Reflect;
use crate::registry::{self, SelectedMember};
use std::sync::Arc;

/// Upper bound on member counts; a schema beyond this is hostile.
const MAX_SCHEMA_MEMBERS: u64 = u16::MAX as u64;

pub(crate) fn write_schema<T: Reflect>(ctx: &mut WriteCtx<'_>, schema: &Schema) -> Result<()> {
    registry::write_type::<T>(ctx)?;
    ctx.out.write_var_u64(schema.members.len() as u64);
    for member in &schema.members {
        debug_assert!(!member.is_skip());
        ctx.out.write_str(&member.name);
    }
    Ok(())
}

/// Read a schema and reconcile each persisted name against the current
/// type's selected members. Unresolvable names become skip members.
pub(crate) fn read_schema<T: Reflect>(
    ctx: &mut ReadCtx<'_>,
    selected: &[SelectedMember<T>],
) -> Result<Schema> {
    registry::read_type::<T>(ctx)?;
    let count = ctx.input.read_var_u64()?;
    if count > MAX_SCHEMA_MEMBERS {
        return Err(StrataError::MaliciousInput {
            what: "schema member count",
            declared: count,
            limit: MAX_SCHEMA_MEMBERS,
        });
    }
    let max_name = ctx.engine.config().limits.max_string_len;
    let mut members = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let name = ctx.input.read_str_bounded(max_name)?;
        let member = selected.iter().position(|m| m.matches(&name));
        if member.is_none() {
            log::debug!(
                "[strata] persisted member '{}' of '{}' has no current counterpart, skipping",
                name,
                T::type_name()
            );
        }
        members.push(SchemaMember {
            name: Arc::from(name.as_str()),
            member,
        });
    }
    Ok(Schema {
        type_name: Arc::from(T::type_name()),
        members,
    })
}
