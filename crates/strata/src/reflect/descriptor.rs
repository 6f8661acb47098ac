// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Member descriptors: one entry per serializable member of a type.

use crate::engine::{Engine, ReadCtx, WriteCtx};
use crate::error::Result;
use crate::fmt::Formattable;
use std::any::TypeId;

/// How a member is backed in source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// Plain struct field.
    Field,
    /// Accessor-backed property (get/set function pair).
    Property,
}

/// Policy flags attached to a member at declaration time.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemberFlags {
    /// No plain mutable slot; written back through its accessor only.
    pub readonly: bool,
    /// Generated backing member, discarded unless synthetic members are kept.
    pub synthetic: bool,
    /// Marked as never participating in serialization.
    pub non_serialized: bool,
    /// Not publicly visible; only the `All` targeting rule admits it.
    pub private: bool,
    /// Member-level include/exclude attribute.
    pub include: Option<bool>,
}

/// Erased view of a member, handed to the `should_serialize` hook.
pub struct MemberView<'a> {
    pub name: &'static str,
    pub kind: MemberKind,
    pub flags: &'a MemberFlags,
    pub declared_type_name: &'static str,
}

pub(crate) type WriteFn<T> = Box<dyn Fn(&mut WriteCtx<'_>, &T) -> Result<()> + Send + Sync>;
pub(crate) type ReadFn<T> = Box<dyn Fn(&mut ReadCtx<'_>, &mut T) -> Result<()> + Send + Sync>;

/// A member bound to its resolved formatter: a write closure and an in-place
/// read closure with no remaining dispatch.
pub struct BoundMember<T> {
    pub(crate) write: WriteFn<T>,
    pub(crate) read: ReadFn<T>,
}

type MemberBinder<T> = Box<dyn Fn(&Engine, TypeId, &'static str) -> Result<BoundMember<T>> + Send + Sync>;

/// Descriptor for one member of `T`: identity, policy flags and accessors.
pub struct MemberDescriptor<T: 'static> {
    name: &'static str,
    alias: Option<&'static str>,
    alt_names: &'static [&'static str],
    kind: MemberKind,
    flags: MemberFlags,
    declared_type: TypeId,
    declared_type_name: &'static str,
    binder: MemberBinder<T>,
}

impl<T: 'static> MemberDescriptor<T> {
    /// Describe a plain field with direct accessors.
    pub fn field<F: Formattable>(
        name: &'static str,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> Self {
        Self::with_kind(name, MemberKind::Field, get, get_mut)
    }

    /// Describe an accessor-backed property.
    pub fn property<F: Formattable>(
        name: &'static str,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> Self {
        Self::with_kind(name, MemberKind::Property, get, get_mut)
    }

    fn with_kind<F: Formattable>(
        name: &'static str,
        kind: MemberKind,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> Self {
        Self {
            name,
            alias: None,
            alt_names: &[],
            kind,
            flags: MemberFlags::default(),
            declared_type: TypeId::of::<F>(),
            declared_type_name: std::any::type_name::<F>(),
            binder: Box::new(move |engine, owner, member| {
                let fmt = engine.member_formatter::<F>(owner, member)?;
                let read_fmt = fmt.clone();
                Ok(BoundMember {
                    write: Box::new(move |ctx, value| fmt.serialize(ctx, get(value))),
                    read: Box::new(move |ctx, value| read_fmt.deserialize(ctx, get_mut(value))),
                })
            }),
        }
    }

    /// Reclassify as an accessor-backed property.
    pub fn as_property(mut self) -> Self {
        self.kind = MemberKind::Property;
        self
    }

    /// Declaration-time persistent-name override.
    pub fn alias(mut self, alias: &'static str) -> Self {
        self.alias = Some(alias);
        self
    }

    /// Alternative persistent names, consulted only during read-side
    /// reconciliation.
    pub fn alt_names(mut self, names: &'static [&'static str]) -> Self {
        self.alt_names = names;
        self
    }

    pub fn readonly(mut self) -> Self {
        self.flags.readonly = true;
        self
    }

    pub fn synthetic(mut self) -> Self {
        self.flags.synthetic = true;
        self
    }

    pub fn non_serialized(mut self) -> Self {
        self.flags.non_serialized = true;
        self
    }

    pub fn private(mut self) -> Self {
        self.flags.private = true;
        self
    }

    /// Member-level include attribute.
    pub fn include(mut self) -> Self {
        self.flags.include = Some(true);
        self
    }

    /// Member-level exclude attribute.
    pub fn exclude(mut self) -> Self {
        self.flags.include = Some(false);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Declaration-time persistent name: the alias if set, else the declared
    /// name. Runtime configuration may override this per member.
    pub fn declared_persistent_name(&self) -> &'static str {
        self.alias.unwrap_or(self.name)
    }

    pub fn alternative_names(&self) -> &'static [&'static str] {
        self.alt_names
    }

    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    pub fn flags(&self) -> &MemberFlags {
        &self.flags
    }

    pub fn declared_type(&self) -> TypeId {
        self.declared_type
    }

    pub fn declared_type_name(&self) -> &'static str {
        self.declared_type_name
    }

    pub fn view(&self) -> MemberView<'_> {
        MemberView {
            name: self.name,
            kind: self.kind,
            flags: &self.flags,
            declared_type_name: self.declared_type_name,
        }
    }

    /// Resolve the member's declared-type formatter and capture it in a pair
    /// of dispatch-free closures.
    pub(crate) fn bind(&self, engine: &Engine, owner: TypeId) -> Result<BoundMember<T>> {
        (self.binder)(engine, owner, self.name)
    }
}
