// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Built-in formatters for fixed-width primitives and strings.

use super::{Formattable, Formatter};
use crate::engine::{Engine, ReadCtx, WriteCtx};
use crate::error::{Result, StrataError};
use std::sync::Arc;

/// Generate a formatter struct plus the `Formattable` wiring for one
/// fixed-width primitive.
macro_rules! impl_primitive_formatter {
    ($fmt:ident, $ty:ty, $write:ident, $read:ident) => {
        pub(crate) struct $fmt;

        impl Formatter<$ty> for $fmt {
            fn serialize(&self, ctx: &mut WriteCtx<'_>, value: &$ty) -> Result<()> {
                ctx.out.$write(*value);
                Ok(())
            }

            fn deserialize(&self, ctx: &mut ReadCtx<'_>, into: &mut $ty) -> Result<()> {
                *into = ctx.input.$read()?;
                Ok(())
            }
        }

        impl Formattable for $ty {
            fn formatter(_engine: &Engine) -> Result<Arc<dyn Formatter<Self>>> {
                Ok(Arc::new($fmt))
            }
        }
    };
}

impl_primitive_formatter!(U8Formatter, u8, write_u8, read_u8);
impl_primitive_formatter!(U16Formatter, u16, write_u16_le, read_u16_le);
impl_primitive_formatter!(U32Formatter, u32, write_u32_le, read_u32_le);
impl_primitive_formatter!(U64Formatter, u64, write_u64_le, read_u64_le);
impl_primitive_formatter!(I8Formatter, i8, write_i8, read_i8);
impl_primitive_formatter!(I16Formatter, i16, write_i16_le, read_i16_le);
impl_primitive_formatter!(I32Formatter, i32, write_i32_le, read_i32_le);
impl_primitive_formatter!(I64Formatter, i64, write_i64_le, read_i64_le);
impl_primitive_formatter!(F32Formatter, f32, write_f32_le, read_f32_le);
impl_primitive_formatter!(F64Formatter, f64, write_f64_le, read_f64_le);

pub(crate) struct BoolFormatter;

impl Formatter<bool> for BoolFormatter {
    fn serialize(&self, ctx: &mut WriteCtx<'_>, value: &bool) -> Result<()> {
        ctx.out.write_u8(u8::from(*value));
        Ok(())
    }

    fn deserialize(&self, ctx: &mut ReadCtx<'_>, into: &mut bool) -> Result<()> {
        *into = ctx.input.read_u8()? != 0;
        Ok(())
    }
}

impl Formattable for bool {
    fn formatter(_engine: &Engine) -> Result<Arc<dyn Formatter<Self>>> {
        Ok(Arc::new(BoolFormatter))
    }
}

pub(crate) struct CharFormatter;

impl Formatter<char> for CharFormatter {
    fn serialize(&self, ctx: &mut WriteCtx<'_>, value: &char) -> Result<()> {
        ctx.out.write_u32_le(*value as u32);
        Ok(())
    }

    fn deserialize(&self, ctx: &mut ReadCtx<'_>, into: &mut char) -> Result<()> {
        let raw = ctx.input.read_u32_le()?;
        *into = char::from_u32(raw).ok_or(StrataError::MaliciousInput {
            what: "char scalar",
            declared: u64::from(raw),
            limit: u64::from(char::MAX as u32),
        })?;
        Ok(())
    }
}

impl Formattable for char {
    fn formatter(_engine: &Engine) -> Result<Arc<dyn Formatter<Self>>> {
        Ok(Arc::new(CharFormatter))
    }
}

/// Length-prefixed UTF-8 string, bounded by `max_string_len` on read.
pub(crate) struct StringFormatter;

impl Formatter<String> for StringFormatter {
    fn serialize(&self, ctx: &mut WriteCtx<'_>, value: &String) -> Result<()> {
        ctx.out.write_str(value);
        Ok(())
    }

    fn deserialize(&self, ctx: &mut ReadCtx<'_>, into: &mut String) -> Result<()> {
        let max = ctx.engine.config().limits.max_string_len;
        *into = ctx.input.read_str_bounded(max)?;
        Ok(())
    }
}

impl Formattable for String {
    fn formatter(_engine: &Engine) -> Result<Arc<dyn Formatter<Self>>> {
        Ok(Arc::new(StringFormatter))
    }
}
