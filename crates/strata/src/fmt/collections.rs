// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Built-in formatters for sequences, sets, mappings, options and boxes.
//!
//! Every length-prefixed read compares the declared element count against
//! the matching size limit before any proportional allocation; initial
//! capacities are additionally capped by the bytes remaining in the input.

use super::{Formattable, Formatter};
use crate::engine::{Engine, ReadCtx, WriteCtx};
use crate::error::{Result, StrataError};
use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;

fn check_len(what: &'static str, declared: u64, limit: u32) -> Result<usize> {
    if declared > u64::from(limit) {
        log::warn!(
            "[strata] rejecting {} of declared length {} (limit {})",
            what,
            declared,
            limit
        );
        return Err(StrataError::MaliciousInput {
            what,
            declared,
            limit: u64::from(limit),
        });
    }
    Ok(declared as usize)
}

/// Sequence formatter: varuint element count, then the elements.
///
/// `Vec<u8>` is classified as a byte array and checked against
/// `max_byte_array_len`; every other element type is checked against
/// `max_array_len`.
pub(crate) struct SeqFormatter<T> {
    elem: Arc<dyn Formatter<T>>,
    byte_mode: bool,
}

impl<T: Formattable + Default> Formatter<Vec<T>> for SeqFormatter<T> {
    fn serialize(&self, ctx: &mut WriteCtx<'_>, value: &Vec<T>) -> Result<()> {
        ctx.out.write_var_u64(value.len() as u64);
        for elem in value {
            self.elem.serialize(ctx, elem)?;
        }
        Ok(())
    }

    fn deserialize(&self, ctx: &mut ReadCtx<'_>, into: &mut Vec<T>) -> Result<()> {
        let declared = ctx.input.read_var_u64()?;
        let limits = ctx.engine.config().limits;
        let len = if self.byte_mode {
            check_len("byte array", declared, limits.max_byte_array_len)?
        } else {
            check_len("array", declared, limits.max_array_len)?
        };
        into.clear();
        into.reserve(len.min(ctx.input.remaining()));
        for _ in 0..len {
            let mut elem = T::default();
            self.elem.deserialize(ctx, &mut elem)?;
            into.push(elem);
        }
        Ok(())
    }
}

impl<T: Formattable + Default> Formattable for Vec<T> {
    fn formatter(engine: &Engine) -> Result<Arc<dyn Formatter<Self>>> {
        Ok(Arc::new(SeqFormatter {
            elem: engine.formatter::<T>()?,
            byte_mode: TypeId::of::<T>() == TypeId::of::<u8>(),
        }))
    }
}

/// Fixed-size arrays: elements back-to-back, no length on the wire.
pub(crate) struct ArrayFormatter<T> {
    elem: Arc<dyn Formatter<T>>,
}

impl<T: Formattable, const N: usize> Formatter<[T; N]> for ArrayFormatter<T> {
    fn serialize(&self, ctx: &mut WriteCtx<'_>, value: &[T; N]) -> Result<()> {
        for elem in value {
            self.elem.serialize(ctx, elem)?;
        }
        Ok(())
    }

    fn deserialize(&self, ctx: &mut ReadCtx<'_>, into: &mut [T; N]) -> Result<()> {
        for elem in into.iter_mut() {
            self.elem.deserialize(ctx, elem)?;
        }
        Ok(())
    }
}

impl<T: Formattable, const N: usize> Formattable for [T; N] {
    fn formatter(engine: &Engine) -> Result<Arc<dyn Formatter<Self>>> {
        Ok(Arc::new(ArrayFormatter {
            elem: engine.formatter::<T>()?,
        }))
    }
}

/// Set formatter, bounded by `max_collection_len`.
pub(crate) struct SetFormatter<T> {
    elem: Arc<dyn Formatter<T>>,
}

impl<T: Formattable + Default + Eq + Hash> Formatter<HashSet<T>> for SetFormatter<T> {
    fn serialize(&self, ctx: &mut WriteCtx<'_>, value: &HashSet<T>) -> Result<()> {
        ctx.out.write_var_u64(value.len() as u64);
        for elem in value {
            self.elem.serialize(ctx, elem)?;
        }
        Ok(())
    }

    fn deserialize(&self, ctx: &mut ReadCtx<'_>, into: &mut HashSet<T>) -> Result<()> {
        let declared = ctx.input.read_var_u64()?;
        let limit = ctx.engine.config().limits.max_collection_len;
        let len = check_len("collection", declared, limit)?;
        into.clear();
        for _ in 0..len {
            let mut elem = T::default();
            self.elem.deserialize(ctx, &mut elem)?;
            into.insert(elem);
        }
        Ok(())
    }
}

impl<T: Formattable + Default + Eq + Hash> Formattable for HashSet<T> {
    fn formatter(engine: &Engine) -> Result<Arc<dyn Formatter<Self>>> {
        Ok(Arc::new(SetFormatter {
            elem: engine.formatter::<T>()?,
        }))
    }
}

/// Mapping formatter, bounded by `max_collection_len`.
pub(crate) struct MapFormatter<K, V> {
    key: Arc<dyn Formatter<K>>,
    value: Arc<dyn Formatter<V>>,
}

impl<K, V> Formatter<HashMap<K, V>> for MapFormatter<K, V>
where
    K: Formattable + Default + Eq + Hash,
    V: Formattable + Default,
{
    fn serialize(&self, ctx: &mut WriteCtx<'_>, value: &HashMap<K, V>) -> Result<()> {
        ctx.out.write_var_u64(value.len() as u64);
        for (k, v) in value {
            self.key.serialize(ctx, k)?;
            self.value.serialize(ctx, v)?;
        }
        Ok(())
    }

    fn deserialize(&self, ctx: &mut ReadCtx<'_>, into: &mut HashMap<K, V>) -> Result<()> {
        let declared = ctx.input.read_var_u64()?;
        let limit = ctx.engine.config().limits.max_collection_len;
        let len = check_len("collection", declared, limit)?;
        into.clear();
        for _ in 0..len {
            let mut k = K::default();
            self.key.deserialize(ctx, &mut k)?;
            let mut v = V::default();
            self.value.deserialize(ctx, &mut v)?;
            into.insert(k, v);
        }
        Ok(())
    }
}

impl<K, V> Formattable for HashMap<K, V>
where
    K: Formattable + Default + Eq + Hash,
    V: Formattable + Default,
{
    fn formatter(engine: &Engine) -> Result<Arc<dyn Formatter<Self>>> {
        Ok(Arc::new(MapFormatter {
            key: engine.formatter::<K>()?,
            value: engine.formatter::<V>()?,
        }))
    }
}

/// Option formatter: one presence byte, then the value.
pub(crate) struct OptionFormatter<T> {
    inner: Arc<dyn Formatter<T>>,
}

impl<T: Formattable + Default> Formatter<Option<T>> for OptionFormatter<T> {
    fn serialize(&self, ctx: &mut WriteCtx<'_>, value: &Option<T>) -> Result<()> {
        match value {
            Some(inner) => {
                ctx.out.write_u8(1);
                self.inner.serialize(ctx, inner)
            }
            None => {
                ctx.out.write_u8(0);
                Ok(())
            }
        }
    }

    fn deserialize(&self, ctx: &mut ReadCtx<'_>, into: &mut Option<T>) -> Result<()> {
        match ctx.input.read_u8()? {
            0 => {
                *into = None;
                Ok(())
            }
            1 => {
                // Reuse the existing value when present.
                let slot = into.get_or_insert_with(T::default);
                self.inner.deserialize(ctx, slot)
            }
            tag => Err(StrataError::MaliciousInput {
                what: "option tag",
                declared: u64::from(tag),
                limit: 1,
            }),
        }
    }
}

impl<T: Formattable + Default> Formattable for Option<T> {
    fn formatter(engine: &Engine) -> Result<Arc<dyn Formatter<Self>>> {
        Ok(Arc::new(OptionFormatter {
            inner: engine.formatter::<T>()?,
        }))
    }
}

/// Box formatter: transparent indirection.
pub(crate) struct BoxFormatter<T> {
    inner: Arc<dyn Formatter<T>>,
}

impl<T: Formattable> Formatter<Box<T>> for BoxFormatter<T> {
    fn serialize(&self, ctx: &mut WriteCtx<'_>, value: &Box<T>) -> Result<()> {
        self.inner.serialize(ctx, value)
    }

    fn deserialize(&self, ctx: &mut ReadCtx<'_>, into: &mut Box<T>) -> Result<()> {
        self.inner.deserialize(ctx, into)
    }
}

impl<T: Formattable> Formattable for Box<T> {
    fn formatter(engine: &Engine) -> Result<Arc<dyn Formatter<Self>>> {
        Ok(Arc::new(BoxFormatter {
            inner: engine.formatter::<T>()?,
        }))
    }
}
