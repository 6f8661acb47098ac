// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// Round-trip coverage for the compact (non-version-tolerant) mode: structural
// equality after encode/decode, exact offset balance, nested objects and the
// built-in collection formatters.

use std::collections::{HashMap, HashSet};
use strata::{reflect, Serializer, SerializerConfig};

#[derive(Default, Debug, PartialEq)]
struct Basic {
    a: i32,
    b: String,
}

reflect! {
    struct Basic("Basic") {
        a: i32,
        b: String,
    }
}

#[derive(Default, Debug, PartialEq)]
struct Inner {
    x: u16,
    y: f64,
}

reflect! {
    struct Inner("Inner") {
        x: u16,
        y: f64,
    }
}

#[derive(Default, Debug, PartialEq)]
struct Outer {
    name: String,
    inner: Inner,
    tags: Vec<String>,
    scores: HashMap<String, u32>,
    flags: HashSet<u8>,
    blob: Vec<u8>,
    maybe: Option<Inner>,
    boxed: Box<u64>,
    fixed: [i16; 3],
}

reflect! {
    struct Outer("Outer") {
        name: String,
        inner: Inner,
        tags: Vec<String>,
        scores: HashMap<String, u32>,
        flags: HashSet<u8>,
        blob: Vec<u8>,
        maybe: Option<Inner>,
        boxed: Box<u64>,
        fixed: [i16; 3],
    }
}

fn roundtrip<T: strata::Formattable + Default + PartialEq + std::fmt::Debug>(
    ser: &mut Serializer,
    value: &T,
) -> T {
    let mut buffer = Vec::new();
    let written = ser.serialize(value, &mut buffer).expect("serialize");
    assert_eq!(written, buffer.len());

    let mut offset = 0;
    let back: T = ser.deserialize(&buffer, &mut offset).expect("deserialize");
    assert_eq!(offset, buffer.len(), "offset balance");
    back
}

#[test]
fn test_basic_struct_roundtrip() {
    let mut ser = Serializer::new(SerializerConfig::default());
    let value = Basic {
        a: 42,
        b: "hi".into(),
    };
    let back = roundtrip(&mut ser, &value);
    assert_eq!(back, value);
}

#[test]
fn test_nested_struct_and_collections_roundtrip() {
    let mut ser = Serializer::new(SerializerConfig::default());
    let value = Outer {
        name: "probe".into(),
        inner: Inner {
            x: 7,
            y: std::f64::consts::PI,
        },
        tags: vec!["alpha".into(), "beta".into()],
        scores: HashMap::from([("one".into(), 1), ("two".into(), 2)]),
        flags: HashSet::from([1, 2, 3]),
        blob: vec![0xDE, 0xAD, 0xBE, 0xEF],
        maybe: Some(Inner { x: 1, y: -1.5 }),
        boxed: Box::new(u64::MAX),
        fixed: [-1, 0, 1],
    };
    let back = roundtrip(&mut ser, &value);
    assert_eq!(back, value);
}

#[test]
fn test_none_and_empty_collections_roundtrip() {
    let mut ser = Serializer::new(SerializerConfig::default());
    let value = Outer::default();
    let back = roundtrip(&mut ser, &value);
    assert_eq!(back, value);
}

#[test]
fn test_primitive_roundtrips() {
    let mut ser = Serializer::new(SerializerConfig::default());
    assert!(roundtrip(&mut ser, &true));
    assert_eq!(roundtrip(&mut ser, &u8::MAX), u8::MAX);
    assert_eq!(roundtrip(&mut ser, &i64::MIN), i64::MIN);
    assert_eq!(roundtrip(&mut ser, &'Ω'), 'Ω');
    assert_eq!(roundtrip(&mut ser, &String::from("héllo")), "héllo");
    assert_eq!(roundtrip(&mut ser, &3.5f32), 3.5f32);
}

#[test]
fn test_deserialize_into_reuses_target() {
    let mut ser = Serializer::new(SerializerConfig::default());
    let value = Basic {
        a: -7,
        b: "fresh".into(),
    };
    let mut buffer = Vec::new();
    ser.serialize(&value, &mut buffer).expect("serialize");

    let mut target = Basic {
        a: 999,
        b: "stale".into(),
    };
    let mut offset = 0;
    ser.deserialize_into(&buffer, &mut offset, &mut target)
        .expect("deserialize");
    assert_eq!(target, value);
}

#[test]
fn test_serialize_appends_at_existing_offset() {
    let mut ser = Serializer::new(SerializerConfig::default());
    let first = Basic {
        a: 1,
        b: "one".into(),
    };
    let second = Basic {
        a: 2,
        b: "two".into(),
    };

    let mut buffer = Vec::new();
    let n1 = ser.serialize(&first, &mut buffer).expect("serialize first");
    let n2 = ser
        .serialize(&second, &mut buffer)
        .expect("serialize second");
    assert_eq!(buffer.len(), n1 + n2);

    let mut offset = 0;
    let b1: Basic = ser.deserialize(&buffer, &mut offset).expect("first back");
    let b2: Basic = ser.deserialize(&buffer, &mut offset).expect("second back");
    assert_eq!(offset, buffer.len());
    assert_eq!(b1, first);
    assert_eq!(b2, second);
}

#[derive(Clone, Copy, Default, Debug, PartialEq)]
#[repr(C)]
struct Vec3 {
    x: f32,
    y: f32,
    z: f32,
}

// SAFETY: repr(C), Copy, floats only, no padding (3x4 bytes), any bit
// pattern is valid.
unsafe impl strata::Pod for Vec3 {}

reflect! {
    struct Vec3("Vec3") {
        x: f32,
        y: f32,
        z: f32,
    }
}

#[test]
fn test_reinterpret_fast_path_roundtrip() {
    // Version tolerance would embed a schema; the reinterpret registration
    // bypasses it, so the encoding must be exactly the raw struct bytes.
    let mut config = SerializerConfig::default();
    config.version_tolerance = strata::VersionTolerance::AutomaticEmbedded;
    config.reinterpret_type::<Vec3>();
    let mut ser = Serializer::new(config);

    let value = Vec3 {
        x: 1.0,
        y: -2.0,
        z: 0.5,
    };
    let mut buffer = Vec::new();
    ser.serialize(&value, &mut buffer).expect("serialize");
    assert_eq!(buffer.len(), std::mem::size_of::<Vec3>());

    let mut offset = 0;
    let back: Vec3 = ser.deserialize(&buffer, &mut offset).expect("deserialize");
    assert_eq!(back, value);
    assert_eq!(offset, buffer.len());
}

#[test]
fn test_reinterpret_registration_ignored_when_disabled() {
    let mut config = SerializerConfig::default();
    config.version_tolerance = strata::VersionTolerance::AutomaticEmbedded;
    config.use_reinterpret_formatter = false;
    config.reinterpret_type::<Vec3>();
    let mut ser = Serializer::new(config);

    let value = Vec3 {
        x: 4.0,
        y: 5.0,
        z: 6.0,
    };
    let mut buffer = Vec::new();
    ser.serialize(&value, &mut buffer).expect("serialize");
    // Schema-embedded encoding is strictly larger than the raw bytes.
    assert!(buffer.len() > std::mem::size_of::<Vec3>());

    let mut offset = 0;
    let back: Vec3 = ser.deserialize(&buffer, &mut offset).expect("deserialize");
    assert_eq!(back, value);
}
