// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Delegate serialization: registry-named callables on the wire.
//!
//! A [`Delegate`] is a handle to a function registered by name through
//! [`SerializerConfig::register_delegate`](crate::SerializerConfig::register_delegate).
//! Static delegates serialize as their name alone; instance delegates
//! additionally carry a serialized state payload. Closures with arbitrary
//! captures are not representable and cannot cross the boundary.

use super::{Formattable, Formatter};
use crate::config::DelegateSerialization;
use crate::engine::{Engine, ReadCtx, WriteCtx};
use crate::error::{Result, StrataError};
use std::sync::Arc;

/// Serializable handle to a registry-named callable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delegate {
    name: Arc<str>,
    /// Captured state payload; present only for instance delegates.
    state: Option<Vec<u8>>,
}

impl Delegate {
    /// A static delegate: the registered name is the whole identity.
    pub fn named(name: impl AsRef<str>) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            state: None,
        }
    }

    /// An instance delegate carrying serialized captured state.
    pub fn with_state(name: impl AsRef<str>, state: Vec<u8>) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            state: Some(state),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> Option<&[u8]> {
        self.state.as_deref()
    }

    pub fn is_instance(&self) -> bool {
        self.state.is_some()
    }
}

impl Default for Delegate {
    fn default() -> Self {
        Self::named("")
    }
}

pub(crate) struct DelegateFormatter;

fn check_mode(mode: DelegateSerialization, delegate_is_instance: bool) -> Result<()> {
    match mode {
        DelegateSerialization::Off => Err(StrataError::DelegateNotAllowed {
            reason: "delegate serialization is off".into(),
        }),
        DelegateSerialization::AllowStatic if delegate_is_instance => {
            Err(StrataError::DelegateNotAllowed {
                reason: "instance delegates require AllowInstance".into(),
            })
        }
        _ => Ok(()),
    }
}

fn check_registered(engine: &Engine, name: &str) -> Result<()> {
    let registry = &engine.config().delegates;
    if !registry.is_empty() && !registry.contains(name) {
        return Err(StrataError::DelegateNotAllowed {
            reason: format!("delegate '{}' is not registered", name),
        });
    }
    Ok(())
}

impl Formatter<Delegate> for DelegateFormatter {
    fn serialize(&self, ctx: &mut WriteCtx<'_>, value: &Delegate) -> Result<()> {
        check_mode(ctx.engine.config().delegate_serialization, value.is_instance())?;
        check_registered(ctx.engine, value.name())?;
        ctx.out.write_str(&value.name);
        match &value.state {
            Some(state) => {
                ctx.out.write_u8(1);
                ctx.out.write_var_u64(state.len() as u64);
                ctx.out.write_bytes(state);
            }
            None => ctx.out.write_u8(0),
        }
        Ok(())
    }

    fn deserialize(&self, ctx: &mut ReadCtx<'_>, into: &mut Delegate) -> Result<()> {
        let mode = ctx.engine.config().delegate_serialization;
        if mode == DelegateSerialization::Off {
            return Err(StrataError::DelegateNotAllowed {
                reason: "delegate serialization is off".into(),
            });
        }
        let max_name = ctx.engine.config().limits.max_string_len;
        let name = ctx.input.read_str_bounded(max_name)?;
        check_registered(ctx.engine, &name)?;
        let state = match ctx.input.read_u8()? {
            0 => None,
            1 => {
                check_mode(mode, true)?;
                let declared = ctx.input.read_var_u64()?;
                let limit = ctx.engine.config().limits.max_byte_array_len;
                if declared > u64::from(limit) {
                    return Err(StrataError::MaliciousInput {
                        what: "delegate state",
                        declared,
                        limit: u64::from(limit),
                    });
                }
                Some(ctx.input.read_bytes(declared as usize)?.to_vec())
            }
            tag => {
                return Err(StrataError::MaliciousInput {
                    what: "delegate state tag",
                    declared: u64::from(tag),
                    limit: 1,
                })
            }
        };
        *into = Delegate {
            name: Arc::from(name.as_str()),
            state,
        };
        Ok(())
    }
}

impl Formattable for Delegate {
    fn formatter(_engine: &Engine) -> Result<Arc<dyn Formatter<Self>>> {
        Ok(Arc::new(DelegateFormatter))
    }
}
