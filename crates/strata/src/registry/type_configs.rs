// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Lazily populated per-type configuration store.

use super::type_config::TypeConfig;
use crate::config::OnNewType;
use crate::reflect::Reflect;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::any::TypeId;
use std::sync::Arc;

/// Registry of [`TypeConfig`] entries, keyed by runtime type.
///
/// Two lookup flavors:
/// - *configuration lookup* creates missing entries from defaults without
///   firing the first-touch callback (public configure API);
/// - *usage lookup* additionally fires the callback exactly once when the
///   entry is created by the engine encountering the type.
#[derive(Default)]
pub(crate) struct TypeConfigRegistry {
    configs: DashMap<TypeId, Arc<RwLock<TypeConfig>>>,
}

impl TypeConfigRegistry {
    pub fn config_lookup<T: Reflect>(&self) -> Arc<RwLock<TypeConfig>> {
        self.configs
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Arc::new(RwLock::new(TypeConfig::new(T::type_name()))))
            .clone()
    }

    pub fn usage_lookup<T: Reflect>(&self, on_new_type: Option<&OnNewType>) -> Arc<RwLock<TypeConfig>> {
        let mut created = false;
        let cfg = self
            .configs
            .entry(TypeId::of::<T>())
            .or_insert_with(|| {
                created = true;
                Arc::new(RwLock::new(TypeConfig::new(T::type_name())))
            })
            .clone();
        if created {
            log::debug!("[strata] first touch of type '{}'", T::type_name());
            if let Some(hook) = on_new_type {
                hook(&mut *cfg.write());
            }
        }
        cfg
    }

    pub fn raw(&self, id: TypeId) -> Option<Arc<RwLock<TypeConfig>>> {
        self.configs.get(&id).map(|entry| entry.clone())
    }
}
