// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Serializer configuration - single source of truth.
//!
//! This module centralizes every engine tunable: feature toggles, member
//! targeting defaults, adversarial-input size limits, the known-types table
//! and all user hooks. A [`SerializerConfig`] is consumed by
//! [`Serializer::new`](crate::Serializer::new); after the first
//! `serialize`/`deserialize` call the engine is sealed and further mutation
//! fails with `ConfigurationLocked`.
//!
//! # Example
//!
//! ```
//! use strata::{SerializerConfig, VersionTolerance};
//!
//! let mut config = SerializerConfig::default();
//! config.version_tolerance = VersionTolerance::AutomaticEmbedded;
//! config.limits.max_byte_array_len = 1024;
//! ```

use crate::engine::Engine;
use crate::error::{Result, StrataError};
use crate::reflect::{MemberView, Reflect};
use crate::registry::TypeBinder;
use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Version-tolerance discipline for reflected types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VersionTolerance {
    /// Compact mode: members back-to-back, no schema data on the wire.
    #[default]
    Disabled,
    /// Every object graph embeds each type's schema once; member payloads
    /// carry byte-count prefixes so out-of-date readers can skip them.
    AutomaticEmbedded,
}

/// Default member-targeting rule.
///
/// The `reflect!` macro records each member as a plain field or an
/// accessor-backed property; this rule decides which of them participate
/// when no more specific setting applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetMember {
    #[default]
    Fields,
    Properties,
    FieldsAndProperties,
    /// Everything, including members flagged `private`.
    All,
}

impl TargetMember {
    /// Whether a member of the given kind/visibility falls under this rule.
    pub(crate) fn admits(self, kind: crate::reflect::MemberKind, private: bool) -> bool {
        use crate::reflect::MemberKind;
        match self {
            TargetMember::All => true,
            _ if private => false,
            TargetMember::Fields => kind == MemberKind::Field,
            TargetMember::Properties => kind == MemberKind::Property,
            TargetMember::FieldsAndProperties => true,
        }
    }
}

/// Policy for members declared `readonly`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadonlyFieldHandling {
    /// Readonly members never participate.
    #[default]
    Exclude,
    /// Deserialize through the member's accessor in place, populating the
    /// existing value.
    MembersOnly,
    /// Replace the value wholesale.
    ForcedOverwrite,
}

/// Which delegates may cross the serialization boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DelegateSerialization {
    #[default]
    Off,
    /// Registry-named plain `fn` delegates only.
    AllowStatic,
    /// Additionally, delegates carrying a serialized state payload.
    AllowInstance,
}

/// Read-side caps on every length-prefixed construct.
///
/// Violations fail with `MaliciousInput` before any allocation proportional
/// to the declared size.
#[derive(Debug, Clone, Copy)]
pub struct SizeLimits {
    pub max_string_len: u32,
    /// Non-byte arrays and sequences.
    pub max_array_len: u32,
    pub max_byte_array_len: u32,
    /// Generic collections (maps, sets).
    pub max_collection_len: u32,
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self {
            max_string_len: u32::MAX,
            max_array_len: u32::MAX,
            max_byte_array_len: u32::MAX,
            max_collection_len: u32::MAX,
        }
    }
}

/// One entry of the known-types table.
pub(crate) struct KnownType {
    pub id: TypeId,
    pub name: &'static str,
    /// Persistent member names at registration time, folded into the
    /// protocol checksum.
    pub member_names: Vec<&'static str>,
}

/// User formatter resolver: consulted before the built-ins, in insertion
/// order. A `Some` return must box an `Arc<dyn Formatter<T>>` for the asked
/// `TypeId`.
pub type FormatterResolver =
    Arc<dyn Fn(&Engine, TypeId) -> Option<Box<dyn Any + Send + Sync>> + Send + Sync>;

/// First-touch callback, fired once per type on first usage lookup.
pub type OnNewType = Arc<dyn Fn(&mut crate::registry::TypeConfig) + Send + Sync>;

/// Member-selection hook: `Some(bool)` decides, `None` defers to attributes.
pub type ShouldSerialize =
    Arc<dyn Fn(&'static str, &MemberView<'_>) -> Option<bool> + Send + Sync>;

/// External root-object resolution by identity (behavior external to the
/// engine; the config only carries the hook).
pub type ExternalObjectResolver =
    Arc<dyn Fn(u64) -> Option<Box<dyn Any + Send + Sync>> + Send + Sync>;

/// Notification hook for externally resolved objects.
pub type OnExternalObject = Arc<dyn Fn(&dyn Any) + Send + Sync>;

/// Discard callback invoked when deserialization replaces an object.
pub type DiscardObject = Arc<dyn Fn(&mut dyn Any) + Send + Sync>;

pub(crate) struct ExplicitFormatter {
    /// Boxed `Arc<dyn Formatter<T>>`.
    pub fmt: Box<dyn Any + Send + Sync>,
    /// Registered through the reinterpret fast path; honored only while
    /// `use_reinterpret_formatter` is set.
    pub reinterpret: bool,
}

/// Complete serializer configuration.
///
/// Option fields are plain `pub`; hooks and tables go through methods that
/// enforce their assignment discipline.
pub struct SerializerConfig {
    /// Reference-identity preservation across a graph.
    pub preserve_references: bool,
    /// Honor members declared `non_serialized`.
    pub respect_non_serialized: bool,
    pub version_tolerance: VersionTolerance,
    pub default_targets: TargetMember,
    pub readonly_field_handling: ReadonlyFieldHandling,
    /// Prefix every stream with the protocol checksum.
    pub embed_checksum: bool,
    /// Retain the wire type-id table across invocations. Only safe for
    /// paired stateful endpoints.
    pub persist_type_cache: bool,
    /// Reject types absent from the known-types table at runtime.
    pub seal_types_when_using_known_types: bool,
    /// Discard members flagged `synthetic` before selection.
    pub skip_synthetic_members: bool,
    pub delegate_serialization: DelegateSerialization,
    /// Honor reinterpret (native-endian byte copy) registrations.
    pub use_reinterpret_formatter: bool,
    pub limits: SizeLimits,

    pub(crate) known: Vec<KnownType>,
    pub(crate) resolvers: Vec<FormatterResolver>,
    pub(crate) on_new_type: Option<OnNewType>,
    pub(crate) should_serialize: Option<ShouldSerialize>,
    pub(crate) explicit: HashMap<TypeId, ExplicitFormatter>,
    pub(crate) delegates: HashSet<String>,
    pub(crate) type_binder: Option<Arc<dyn TypeBinder>>,
    pub(crate) external_object_resolver: Option<ExternalObjectResolver>,
    pub(crate) on_external_object: Option<OnExternalObject>,
    pub(crate) discard_object: Option<DiscardObject>,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            preserve_references: true,
            respect_non_serialized: true,
            version_tolerance: VersionTolerance::Disabled,
            default_targets: TargetMember::Fields,
            readonly_field_handling: ReadonlyFieldHandling::Exclude,
            embed_checksum: false,
            persist_type_cache: false,
            seal_types_when_using_known_types: true,
            skip_synthetic_members: true,
            delegate_serialization: DelegateSerialization::Off,
            use_reinterpret_formatter: true,
            limits: SizeLimits::default(),
            known: Vec::new(),
            resolvers: Vec::new(),
            on_new_type: None,
            should_serialize: None,
            explicit: HashMap::new(),
            delegates: HashSet::new(),
            type_binder: None,
            external_object_resolver: None,
            on_external_object: None,
            discard_object: None,
        }
    }
}

impl SerializerConfig {
    /// Append a type to the known-types table.
    ///
    /// A non-empty table switches type identity to compact index encoding
    /// and, under `seal_types_when_using_known_types`, closes the world:
    /// serializing any other reflected type fails with `UnknownType`. New
    /// types may only be appended across compatible versions.
    pub fn add_known_type<T: Reflect>(&mut self) {
        let member_names = T::members()
            .iter()
            .map(|m| m.declared_persistent_name())
            .collect();
        self.known.push(KnownType {
            id: TypeId::of::<T>(),
            name: T::type_name(),
            member_names,
        });
    }

    /// Install a formatter resolver, consulted before the built-ins. The
    /// first resolver returning `Some` wins.
    pub fn add_resolver(&mut self, resolver: FormatterResolver) {
        self.resolvers.push(resolver);
    }

    /// Install the first-touch callback. Single-assignment: re-installing
    /// the same `Arc` is idempotent, any other replacement fails with
    /// `ConfigurationConflict`.
    pub fn on_new_type(&mut self, hook: OnNewType) -> Result<()> {
        if let Some(existing) = &self.on_new_type {
            if Arc::ptr_eq(existing, &hook) {
                return Ok(());
            }
            return Err(StrataError::ConfigurationConflict {
                reason: "on_new_type hook is single-assignment".into(),
            });
        }
        self.on_new_type = Some(hook);
        Ok(())
    }

    /// Install the member-selection hook.
    pub fn should_serialize(&mut self, hook: ShouldSerialize) {
        self.should_serialize = Some(hook);
    }

    /// Register an explicit formatter for a type, bypassing shape-based
    /// resolution. User resolvers still run first.
    pub fn explicit_formatter<T: 'static>(&mut self, fmt: Arc<dyn crate::fmt::Formatter<T>>) {
        self.explicit.insert(
            TypeId::of::<T>(),
            ExplicitFormatter {
                fmt: Box::new(fmt),
                reinterpret: false,
            },
        );
    }

    /// Register the reinterpret fast path for a plain-data type. Honored
    /// only while `use_reinterpret_formatter` is set; observes native
    /// endianness.
    pub fn reinterpret_type<T: crate::fmt::Pod>(&mut self) {
        let fmt: Arc<dyn crate::fmt::Formatter<T>> =
            Arc::new(crate::fmt::ReinterpretFormatter::<T>::new());
        self.explicit.insert(
            TypeId::of::<T>(),
            ExplicitFormatter {
                fmt: Box::new(fmt),
                reinterpret: true,
            },
        );
    }

    /// Register a delegate name. A non-empty registry closes the delegate
    /// world: unregistered names are rejected on both ends.
    pub fn register_delegate(&mut self, name: impl Into<String>) {
        self.delegates.insert(name.into());
    }

    /// Replace the default type binder.
    pub fn type_binder(&mut self, binder: Arc<dyn TypeBinder>) {
        self.type_binder = Some(binder);
    }

    /// Hook for external root-object resolution (identity-based
    /// externalization of entities).
    pub fn external_object_resolver(&mut self, hook: ExternalObjectResolver) {
        self.external_object_resolver = Some(hook);
    }

    pub fn on_external_object(&mut self, hook: OnExternalObject) {
        self.on_external_object = Some(hook);
    }

    pub fn discard_object_method(&mut self, hook: DiscardObject) {
        self.discard_object = Some(hook);
    }

    /// Installed external-object resolver, consumed by externalization
    /// collaborators.
    pub fn external_object_resolver_hook(&self) -> Option<&ExternalObjectResolver> {
        self.external_object_resolver.as_ref()
    }

    pub fn on_external_object_hook(&self) -> Option<&OnExternalObject> {
        self.on_external_object.as_ref()
    }

    pub fn discard_object_hook(&self) -> Option<&DiscardObject> {
        self.discard_object.as_ref()
    }
}
