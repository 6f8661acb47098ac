// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Generic reflective object formatter (non-version-tolerant).
//!
//! Member payloads are written back-to-back in declaration order, with no
//! schema data and no per-member prefixes. Both ends must agree on the
//! member set; the version-tolerant variant lives in
//! [`schema`](crate::schema).

use super::Formatter;
use crate::engine::{Engine, ReadCtx, WriteCtx};
use crate::error::Result;
use crate::reflect::{BoundMember, Reflect};
use std::any::TypeId;
use std::sync::Arc;

pub struct ObjectFormatter<T: Reflect> {
    members: Vec<(Arc<str>, BoundMember<T>)>,
}

impl<T: Reflect> ObjectFormatter<T> {
    pub(crate) fn new(engine: &Engine) -> Result<Self> {
        let owner = TypeId::of::<T>();
        let members = engine
            .selected_members::<T>()
            .into_iter()
            .map(|m| {
                let bound = m.desc.bind(engine, owner)?;
                Ok((m.persistent, bound))
            })
            .collect::<Result<_>>()?;
        Ok(Self { members })
    }
}

impl<T: Reflect> Formatter<T> for ObjectFormatter<T> {
    fn serialize(&self, ctx: &mut WriteCtx<'_>, value: &T) -> Result<()> {
        for (_, member) in &self.members {
            (member.write)(ctx, value)?;
        }
        Ok(())
    }

    fn deserialize(&self, ctx: &mut ReadCtx<'_>, into: &mut T) -> Result<()> {
        for (_, member) in &self.members {
            (member.read)(ctx, into)?;
        }
        Ok(())
    }
}
