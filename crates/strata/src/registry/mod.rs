// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-type configuration, member selection and type identity.
//!
//! The registry resolves, for each encountered runtime type, the set of
//! members participating in serialization, their persistent and alternative
//! names, and the policy knobs that govern them. Type identity on the wire
//! (known-types index, back-reference or string name) lives in
//! [`binder`].

mod binder;
mod type_config;
mod type_configs;

pub use binder::{DefaultBinder, TypeBinder};
pub use type_config::{SelectedMember, TypeConfig};

pub(crate) use binder::{read_type, write_type};
pub(crate) use type_config::select_members;
pub(crate) use type_configs::TypeConfigRegistry;
