// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// Schema evolution: added/removed members, renamed members resolved through
// alternative persistent names, per-member size prefixes and the
// once-per-graph schema emission discipline.

use strata::{reflect, Serializer, SerializerConfig, StrataError, VersionTolerance};

fn tolerant() -> Serializer {
    let mut config = SerializerConfig::default();
    config.version_tolerance = VersionTolerance::AutomaticEmbedded;
    Serializer::new(config)
}

fn count_occurrences(haystack: &[u8], needle: &[u8]) -> usize {
    haystack
        .windows(needle.len())
        .filter(|w| *w == needle)
        .count()
}

// Two shapes of the same persistent type "Player": v1 has only `a`, v2 adds
// `b`. Distinct Rust types stand in for the two program versions.

#[derive(Default, Debug, PartialEq)]
struct PlayerV1 {
    a: i32,
}

reflect! {
    struct PlayerV1("Player") {
        a: i32,
    }
}

#[derive(Default, Debug, PartialEq)]
struct PlayerV2 {
    a: i32,
    b: String,
}

reflect! {
    struct PlayerV2("Player") {
        a: i32,
        b: String,
    }
}

#[test]
fn test_same_shape_roundtrip() {
    let mut ser = tolerant();
    let value = PlayerV2 {
        a: 42,
        b: "hi".into(),
    };
    let mut buffer = Vec::new();
    ser.serialize(&value, &mut buffer).expect("serialize");

    let mut reader = tolerant();
    let mut offset = 0;
    let back: PlayerV2 = reader.deserialize(&buffer, &mut offset).expect("deserialize");
    assert_eq!(back, value);
    assert_eq!(offset, buffer.len());
}

#[test]
fn test_added_member_is_skipped_by_older_reader() {
    let mut writer = tolerant();
    let value = PlayerV2 { a: 7, b: "x".into() };
    let mut buffer = Vec::new();
    writer.serialize(&value, &mut buffer).expect("serialize v2");

    let mut reader = tolerant();
    let mut offset = 0;
    let back: PlayerV1 = reader.deserialize(&buffer, &mut offset).expect("read as v1");
    assert_eq!(back, PlayerV1 { a: 7 });
    // The unknown member's bytes were consumed through its size prefix.
    assert_eq!(offset, buffer.len());
}

#[test]
fn test_removed_member_keeps_target_value() {
    let mut writer = tolerant();
    let value = PlayerV1 { a: 3 };
    let mut buffer = Vec::new();
    writer.serialize(&value, &mut buffer).expect("serialize v1");

    let mut reader = tolerant();
    let mut offset = 0;
    let mut target = PlayerV2 {
        a: 0,
        b: "kept".into(),
    };
    reader
        .deserialize_into(&buffer, &mut offset, &mut target)
        .expect("read as v2");
    assert_eq!(target.a, 3);
    // `b` is absent from the stream; the caller-supplied value survives.
    assert_eq!(target.b, "kept");
    assert_eq!(offset, buffer.len());
}

// Rename scenario: the member used to persist as "level"; the current
// version aliases it to "lvl" and lists the old name as an alternative.

#[derive(Default, Debug, PartialEq)]
struct RankOld {
    level: u32,
}

reflect! {
    struct RankOld("Rank") {
        level: u32,
    }
}

#[derive(Default, Debug, PartialEq)]
struct RankNew {
    level: u32,
}

reflect! {
    struct RankNew("Rank") {
        level: u32 [alias "lvl", alt ["level"]],
    }
}

#[test]
fn test_renamed_member_reconciles_through_alt_names() {
    let mut writer = tolerant();
    let value = RankOld { level: 9 };
    let mut buffer = Vec::new();
    writer.serialize(&value, &mut buffer).expect("serialize old");

    let mut reader = tolerant();
    let mut offset = 0;
    let back: RankNew = reader.deserialize(&buffer, &mut offset).expect("read new");
    assert_eq!(back, RankNew { level: 9 });
}

#[test]
fn test_current_alias_is_what_gets_persisted() {
    let mut writer = tolerant();
    let value = RankNew { level: 4 };
    let mut buffer = Vec::new();
    writer.serialize(&value, &mut buffer).expect("serialize new");

    // The schema names the member "lvl", which the old shape cannot
    // resolve: its payload is skipped and the target keeps its value.
    let mut reader = tolerant();
    let mut offset = 0;
    let mut target = RankOld { level: 123 };
    reader
        .deserialize_into(&buffer, &mut offset, &mut target)
        .expect("read old");
    assert_eq!(target.level, 123);
    assert_eq!(offset, buffer.len());
}

#[derive(Default, Debug, PartialEq)]
struct Nested {
    left: RankNew,
    right: RankNew,
}

reflect! {
    struct Nested("Nested") {
        left: RankNew,
        right: RankNew,
    }
}

#[test]
fn test_schema_written_once_per_graph() {
    let mut ser = tolerant();
    let value = Nested {
        left: RankNew { level: 1 },
        right: RankNew { level: 2 },
    };
    let mut pair = Vec::new();
    ser.serialize(&value, &mut pair).expect("pair");

    // The member name "lvl" only ever appears inside the "Rank" schema; two
    // occurrences would mean the schema was re-emitted for `right`.
    assert_eq!(count_occurrences(&pair, b"lvl"), 1);

    let mut reader = tolerant();
    let mut offset = 0;
    let back: Nested = reader.deserialize(&pair, &mut offset).expect("deserialize");
    assert_eq!(back, value);
    assert_eq!(offset, pair.len());
}

#[derive(Default, Debug, PartialEq)]
struct BigMember {
    data: Vec<u8>,
}

reflect! {
    struct BigMember("BigMember") {
        data: Vec<u8>,
    }
}

#[test]
fn test_member_over_prefix_capacity_fails_on_write() {
    let mut ser = tolerant();
    let value = BigMember {
        data: vec![0u8; 40_000],
    };
    let mut buffer = Vec::new();
    let err = ser.serialize(&value, &mut buffer).unwrap_err();
    match err {
        StrataError::SchemaMismatch { member, .. } => assert_eq!(member, "data"),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_member_under_prefix_capacity_roundtrips() {
    let mut ser = tolerant();
    let value = BigMember {
        data: (0..32_000u32).map(|i| i as u8).collect(),
    };
    let mut buffer = Vec::new();
    ser.serialize(&value, &mut buffer).expect("serialize");

    let mut reader = tolerant();
    let mut offset = 0;
    let back: BigMember = reader.deserialize(&buffer, &mut offset).expect("deserialize");
    assert_eq!(back, value);
}
