// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Reference-identity-preserving formatter for shared cells.
//!
//! `Rc<RefCell<T>>` values are tracked in per-invocation tables: the write
//! side maps allocation addresses to sequential ids and emits back-references
//! for repeats; the read side registers each new cell *before* populating it,
//! so cyclic graphs terminate and reference identity survives the
//! round-trip.
//!
//! Wire form: varuint tag, where `0` introduces a new object followed by its
//! payload, and `n > 0` back-references the `n`-th object of the invocation.

use super::{Formattable, Formatter};
use crate::engine::{Engine, ReadCtx, WriteCtx};
use crate::error::{Result, StrataError};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

pub(crate) struct RcCellFormatter<T> {
    inner: Arc<dyn Formatter<T>>,
    preserve: bool,
}

impl<T: Formattable + Default> Formatter<Rc<RefCell<T>>> for RcCellFormatter<T> {
    fn serialize(&self, ctx: &mut WriteCtx<'_>, value: &Rc<RefCell<T>>) -> Result<()> {
        if !self.preserve {
            return self.inner.serialize(ctx, &*value.borrow());
        }
        let addr = Rc::as_ptr(value) as usize;
        if let Some(&id) = ctx.scratch.ref_ids.get(&addr) {
            ctx.out.write_var_u64(u64::from(id) + 1);
            return Ok(());
        }
        let id = ctx.scratch.ref_ids.len() as u32;
        ctx.scratch.ref_ids.insert(addr, id);
        ctx.out.write_var_u64(0);
        self.inner.serialize(ctx, &*value.borrow())
    }

    fn deserialize(&self, ctx: &mut ReadCtx<'_>, into: &mut Rc<RefCell<T>>) -> Result<()> {
        if !self.preserve {
            let cell = Rc::new(RefCell::new(T::default()));
            self.inner.deserialize(ctx, &mut *cell.borrow_mut())?;
            *into = cell;
            return Ok(());
        }
        let tag = ctx.input.read_var_u32()?;
        if tag == 0 {
            let cell = Rc::new(RefCell::new(T::default()));
            // Register before populating: members may back-reference us.
            ctx.scratch.refs.push(Box::new(cell.clone()));
            self.inner.deserialize(ctx, &mut *cell.borrow_mut())?;
            *into = cell;
            return Ok(());
        }
        let idx = (tag - 1) as usize;
        let table_len = ctx.scratch.refs.len() as u64;
        let entry = ctx
            .scratch
            .refs
            .get(idx)
            .ok_or(StrataError::MaliciousInput {
                what: "object back-reference",
                declared: u64::from(tag),
                limit: table_len,
            })?;
        let cell = entry
            .downcast_ref::<Rc<RefCell<T>>>()
            .ok_or_else(|| StrataError::SchemaMismatch {
                member: String::new(),
                type_name: std::any::type_name::<T>().into(),
                reason: "object back-reference resolves to a different type".into(),
            })?
            .clone();
        *into = cell;
        Ok(())
    }
}

impl<T: Formattable + Default> Formattable for Rc<RefCell<T>> {
    fn formatter(engine: &Engine) -> Result<Arc<dyn Formatter<Self>>> {
        Ok(Arc::new(RcCellFormatter {
            inner: engine.formatter::<T>()?,
            preserve: engine.config().preserve_references,
        }))
    }
}
