// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-type serialization policy and the member-selection algorithm.

use crate::config::{ReadonlyFieldHandling, SerializerConfig, TargetMember};
use crate::reflect::{MemberDescriptor, Reflect};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Per-member override installed through the public configure API.
#[derive(Default)]
pub(crate) struct MemberOverride {
    pub include: Option<bool>,
    pub alias: Option<Arc<str>>,
    /// Boxed `Arc<dyn Formatter<F>>` for the member's declared type.
    pub formatter: Option<Box<dyn Any + Send + Sync>>,
}

/// Serialization policy for one type.
///
/// Obtained through [`Serializer::config_type`](crate::Serializer::config_type)
/// before the engine seals, or handed to the first-touch callback when the
/// engine encounters an unconfigured type.
pub struct TypeConfig {
    type_name: &'static str,
    pub(crate) target: Option<TargetMember>,
    pub(crate) readonly: Option<ReadonlyFieldHandling>,
    pub(crate) skip_synthetic: Option<bool>,
    pub(crate) members: HashMap<&'static str, MemberOverride>,
}

impl TypeConfig {
    pub(crate) fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            target: None,
            readonly: None,
            skip_synthetic: None,
            members: HashMap::new(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Override the member-targeting rule for this type.
    pub fn target_members(&mut self, target: TargetMember) -> &mut Self {
        self.target = Some(target);
        self
    }

    /// Override readonly handling for this type.
    pub fn readonly_handling(&mut self, handling: ReadonlyFieldHandling) -> &mut Self {
        self.readonly = Some(handling);
        self
    }

    /// Override synthetic-member skipping for this type.
    pub fn skip_synthetic_members(&mut self, skip: bool) -> &mut Self {
        self.skip_synthetic = Some(skip);
        self
    }

    /// Force a member in, overriding attributes and targeting rules.
    pub fn include(&mut self, member: &'static str) -> &mut Self {
        self.members.entry(member).or_default().include = Some(true);
        self
    }

    /// Force a member out.
    pub fn exclude(&mut self, member: &'static str) -> &mut Self {
        self.members.entry(member).or_default().include = Some(false);
        self
    }

    /// Override a member's persistent name.
    pub fn alias(&mut self, member: &'static str, persistent: &str) -> &mut Self {
        self.members.entry(member).or_default().alias = Some(Arc::from(persistent));
        self
    }

    /// Bind an explicit formatter to a member. `F` must be the member's
    /// declared type.
    pub fn member_formatter<F: 'static>(
        &mut self,
        member: &'static str,
        fmt: Arc<dyn crate::fmt::Formatter<F>>,
    ) -> &mut Self {
        self.members.entry(member).or_default().formatter = Some(Box::new(fmt));
        self
    }

    pub(crate) fn member_override(&self, member: &str) -> Option<&MemberOverride> {
        self.members.get(member)
    }
}

/// A member that survived selection, with its persistent name resolved
/// (config alias over declaration alias over declared name).
pub struct SelectedMember<T: 'static> {
    pub desc: MemberDescriptor<T>,
    pub persistent: Arc<str>,
}

impl<T: 'static> SelectedMember<T> {
    /// Read-side reconciliation: does a persisted name refer to this member?
    pub(crate) fn matches(&self, wire_name: &str) -> bool {
        self.persistent.as_ref() == wire_name
            || self
                .desc
                .alternative_names()
                .iter()
                .any(|alt| *alt == wire_name)
    }
}

/// Run the member-selection algorithm for `T` under the given configs.
///
/// Precedence, after the synthetic / non-serialized / readonly prefilters:
/// explicit per-member override, then the `should_serialize` hook, then
/// member-level include/exclude attributes, then the type-level targeting
/// rule, then the global default.
pub(crate) fn select_members<T: Reflect>(
    cfg: &TypeConfig,
    global: &SerializerConfig,
) -> Vec<SelectedMember<T>> {
    let skip_synthetic = cfg.skip_synthetic.unwrap_or(global.skip_synthetic_members);
    let readonly = cfg.readonly.unwrap_or(global.readonly_field_handling);
    let rule = cfg
        .target
        .or_else(T::type_targets)
        .unwrap_or(global.default_targets);

    let mut selected = Vec::new();
    for desc in T::members() {
        let flags = *desc.flags();
        if skip_synthetic && flags.synthetic {
            continue;
        }
        if global.respect_non_serialized && flags.non_serialized {
            continue;
        }
        if flags.readonly && readonly == ReadonlyFieldHandling::Exclude {
            continue;
        }

        let by_override = cfg.member_override(desc.name()).and_then(|o| o.include);
        let by_hook = || {
            global
                .should_serialize
                .as_ref()
                .and_then(|hook| hook(T::type_name(), &desc.view()))
        };
        let included = by_override
            .or_else(by_hook)
            .or(flags.include)
            .unwrap_or_else(|| rule.admits(desc.kind(), flags.private));
        if !included {
            continue;
        }

        let persistent: Arc<str> = match cfg.member_override(desc.name()).and_then(|o| o.alias.clone())
        {
            Some(alias) => alias,
            None => Arc::from(desc.declared_persistent_name()),
        };
        selected.push(SelectedMember { desc, persistent });
    }
    selected
}
