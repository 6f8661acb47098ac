// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # strata - version-tolerant reflective binary serialization
//!
//! strata converts object graphs into compact binary buffers and back, with
//! reference preservation, schema evolution and polymorphic dispatch to
//! pluggable formatters. It serves both durable file storage and ephemeral
//! network messaging, with configuration that trades safety for throughput.
//!
//! ## Quick Start
//!
//! ```
//! use strata::{reflect, Serializer, SerializerConfig};
//!
//! #[derive(Default, Debug, PartialEq)]
//! struct Sensor {
//!     id: u32,
//!     label: String,
//! }
//!
//! reflect! {
//!     struct Sensor("Sensor") {
//!         id: u32,
//!         label: String,
//!     }
//! }
//!
//! let mut ser = Serializer::new(SerializerConfig::default());
//! let value = Sensor { id: 7, label: "outdoor".into() };
//!
//! let mut buffer = Vec::new();
//! ser.serialize(&value, &mut buffer).unwrap();
//!
//! let mut offset = 0;
//! let back: Sensor = ser.deserialize(&buffer, &mut offset).unwrap();
//! assert_eq!(back, value);
//! assert_eq!(offset, buffer.len());
//! ```
//!
//! ## Version tolerance
//!
//! With `VersionTolerance::AutomaticEmbedded`, every object graph embeds
//! each type's schema (type identity plus ordered persistent member names)
//! once, and every member payload carries a byte-count prefix. A reader
//! whose type gained or lost members still decodes the stream: unknown
//! payloads are skipped by their prefix, missing members keep the target's
//! existing values, and renamed members reconcile through alternative
//! persistent names.
//!
//! ## Architecture
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`io`] | byte cursors: fixed/var-width integers, strings, patching |
//! | [`reflect`] | member tables and the [`reflect!`] macro |
//! | [`registry`] | per-type policy, member selection, type identity |
//! | [`fmt`] | formatter traits and built-ins (primitives through objects) |
//! | [`schema`] | schema value objects, wire codec, version tolerance |
//! | [`config`] | the whole configuration surface |
//!
//! ## Concurrency
//!
//! A [`Serializer`] and its configuration are not shared across concurrent
//! invocations; instantiate one serializer per worker. Per-invocation state
//! (written schemata, reference tables, the wire type cache) lives inside
//! the serializer, never in globals.

pub mod config;
pub mod engine;
pub mod error;
pub mod fmt;
pub mod io;
pub mod reflect;
pub mod registry;
pub mod schema;

pub use config::{
    DelegateSerialization, DiscardObject, ExternalObjectResolver, FormatterResolver,
    OnExternalObject, OnNewType, ReadonlyFieldHandling, SerializerConfig, ShouldSerialize,
    SizeLimits, TargetMember, VersionTolerance,
};
pub use engine::{Engine, ReadCtx, Serializer, WriteCtx};
pub use error::{Result, StrataError};
pub use fmt::{Delegate, Formattable, Formatter, Pod, ReinterpretFormatter};
pub use reflect::{MemberDescriptor, MemberFlags, MemberKind, MemberView, Reflect};
pub use registry::{DefaultBinder, SelectedMember, TypeBinder, TypeConfig};
pub use schema::{Schema, SchemaMember};
