// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// Configuration surface: per-type member overrides, the first-touch
// callback, user resolvers and delegate modes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use strata::{
    reflect, Delegate, DelegateSerialization, Serializer, SerializerConfig, StrataError,
    VersionTolerance,
};

#[derive(Default, Debug, PartialEq)]
struct Account {
    user: String,
    token: String,
    balance: i64,
}

reflect! {
    struct Account("Account") {
        user: String,
        token: String,
        balance: i64,
    }
}

#[test]
fn test_excluded_member_never_hits_the_wire() {
    let mut ser = Serializer::new(SerializerConfig::default());
    ser.config_type::<Account>(|cfg| {
        cfg.exclude("token");
    })
    .expect("configure");

    let value = Account {
        user: "ada".into(),
        token: "s3cr3t".into(),
        balance: 17,
    };
    let mut buffer = Vec::new();
    ser.serialize(&value, &mut buffer).expect("serialize");
    assert!(!buffer
        .windows(b"s3cr3t".len())
        .any(|w| w == b"s3cr3t"));

    let mut offset = 0;
    let mut target = Account::default();
    ser.deserialize_into(&buffer, &mut offset, &mut target)
        .expect("deserialize");
    assert_eq!(target.user, "ada");
    assert_eq!(target.balance, 17);
    assert_eq!(target.token, "");
    assert_eq!(offset, buffer.len());
}

#[test]
fn test_config_alias_changes_persisted_name() {
    let make = || {
        let mut config = SerializerConfig::default();
        config.version_tolerance = VersionTolerance::AutomaticEmbedded;
        let ser = Serializer::new(config);
        ser.config_type::<Account>(|cfg| {
            cfg.alias("balance", "bal");
        })
        .expect("configure");
        ser
    };

    let mut ser = make();
    let value = Account {
        user: "grace".into(),
        token: "t".into(),
        balance: -3,
    };
    let mut buffer = Vec::new();
    ser.serialize(&value, &mut buffer).expect("serialize");
    assert!(buffer.windows(3).any(|w| w == b"bal"));
    assert!(!buffer.windows(7).any(|w| w == b"balance"));

    let mut reader = make();
    let mut offset = 0;
    let back: Account = reader.deserialize(&buffer, &mut offset).expect("deserialize");
    assert_eq!(back, value);
}

#[test]
fn test_first_touch_callback_fires_once_per_type() {
    let fired = Arc::new(AtomicUsize::new(0));
    let fired_clone = fired.clone();

    let mut config = SerializerConfig::default();
    config
        .on_new_type(Arc::new(move |cfg| {
            fired_clone.fetch_add(1, Ordering::SeqCst);
            if cfg.type_name() == "Account" {
                cfg.exclude("token");
            }
        }))
        .expect("install hook");
    let mut ser = Serializer::new(config);

    let value = Account {
        user: "joan".into(),
        token: "hidden".into(),
        balance: 1,
    };
    let mut buffer = Vec::new();
    ser.serialize(&value, &mut buffer).expect("first");
    ser.serialize(&value, &mut buffer).expect("second");
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert!(!buffer.windows(6).any(|w| w == b"hidden"));
}

#[test]
fn test_user_resolver_wins_over_builtins() {
    use std::any::{Any, TypeId};
    use strata::{Formatter, ReadCtx, WriteCtx};

    // Big-endian u32 formatter, distinguishable from the little-endian
    // built-in.
    struct BeU32;
    impl Formatter<u32> for BeU32 {
        fn serialize(&self, ctx: &mut WriteCtx<'_>, value: &u32) -> strata::Result<()> {
            ctx.out.write_bytes(&value.to_be_bytes());
            Ok(())
        }
        fn deserialize(&self, ctx: &mut ReadCtx<'_>, into: &mut u32) -> strata::Result<()> {
            let mut bytes = [0u8; 4];
            bytes.copy_from_slice(ctx.input.read_bytes(4)?);
            *into = u32::from_be_bytes(bytes);
            Ok(())
        }
    }

    let mut config = SerializerConfig::default();
    config.add_resolver(Arc::new(|_, id| {
        (id == TypeId::of::<u32>()).then(|| {
            let fmt: Arc<dyn Formatter<u32>> = Arc::new(BeU32);
            Box::new(fmt) as Box<dyn Any + Send + Sync>
        })
    }));
    let mut ser = Serializer::new(config);

    let mut buffer = Vec::new();
    ser.serialize(&0x0102_0304u32, &mut buffer).expect("serialize");
    assert_eq!(buffer, [0x01, 0x02, 0x03, 0x04]);

    let mut offset = 0;
    let back: u32 = ser.deserialize(&buffer, &mut offset).expect("deserialize");
    assert_eq!(back, 0x0102_0304);
}

#[test]
fn test_member_formatter_override() {
    use strata::{Formatter, ReadCtx, WriteCtx};

    // Stores the balance negated, proving the override is in the path.
    struct Negated;
    impl Formatter<i64> for Negated {
        fn serialize(&self, ctx: &mut WriteCtx<'_>, value: &i64) -> strata::Result<()> {
            ctx.out.write_i64_le(-*value);
            Ok(())
        }
        fn deserialize(&self, ctx: &mut ReadCtx<'_>, into: &mut i64) -> strata::Result<()> {
            *into = -ctx.input.read_i64_le()?;
            Ok(())
        }
    }

    let mut ser = Serializer::new(SerializerConfig::default());
    ser.config_type::<Account>(|cfg| {
        cfg.member_formatter::<i64>("balance", Arc::new(Negated));
    })
    .expect("configure");

    let value = Account {
        user: "u".into(),
        token: "t".into(),
        balance: 5,
    };
    let mut buffer = Vec::new();
    ser.serialize(&value, &mut buffer).expect("serialize");
    // The raw little-endian encoding of -5 must be present.
    let needle = (-5i64).to_le_bytes();
    assert!(buffer.windows(8).any(|w| w == &needle[..]));

    let mut offset = 0;
    let back: Account = ser.deserialize(&buffer, &mut offset).expect("deserialize");
    assert_eq!(back.balance, 5);
}

#[test]
fn test_delegates_rejected_while_off() {
    let mut ser = Serializer::new(SerializerConfig::default());
    let mut buffer = Vec::new();
    let err = ser
        .serialize(&Delegate::named("on_tick"), &mut buffer)
        .unwrap_err();
    assert!(matches!(err, StrataError::DelegateNotAllowed { .. }));
}

#[test]
fn test_static_delegate_roundtrips_by_name() {
    let make = || {
        let mut config = SerializerConfig::default();
        config.delegate_serialization = DelegateSerialization::AllowStatic;
        config.register_delegate("on_tick");
        Serializer::new(config)
    };

    let mut ser = make();
    let mut buffer = Vec::new();
    ser.serialize(&Delegate::named("on_tick"), &mut buffer)
        .expect("serialize");

    let mut reader = make();
    let mut offset = 0;
    let back: Delegate = reader.deserialize(&buffer, &mut offset).expect("deserialize");
    assert_eq!(back.name(), "on_tick");
    assert!(!back.is_instance());
}

#[test]
fn test_instance_delegate_requires_allow_instance() {
    let mut config = SerializerConfig::default();
    config.delegate_serialization = DelegateSerialization::AllowStatic;
    config.register_delegate("scaled");
    let mut ser = Serializer::new(config);

    let delegate = Delegate::with_state("scaled", vec![2, 0, 0, 0]);
    let mut buffer = Vec::new();
    let err = ser.serialize(&delegate, &mut buffer).unwrap_err();
    assert!(matches!(err, StrataError::DelegateNotAllowed { .. }));

    let make = || {
        let mut config = SerializerConfig::default();
        config.delegate_serialization = DelegateSerialization::AllowInstance;
        config.register_delegate("scaled");
        Serializer::new(config)
    };
    let mut ser = make();
    let mut buffer = Vec::new();
    ser.serialize(&delegate, &mut buffer).expect("serialize");

    let mut reader = make();
    let mut offset = 0;
    let back: Delegate = reader.deserialize(&buffer, &mut offset).expect("deserialize");
    assert_eq!(back.name(), "scaled");
    assert_eq!(back.state(), Some(&[2, 0, 0, 0][..]));
}

#[test]
fn test_unregistered_delegate_rejected() {
    let mut config = SerializerConfig::default();
    config.delegate_serialization = DelegateSerialization::AllowStatic;
    config.register_delegate("known");
    let mut ser = Serializer::new(config);

    let mut buffer = Vec::new();
    let err = ser
        .serialize(&Delegate::named("unknown"), &mut buffer)
        .unwrap_err();
    assert!(matches!(err, StrataError::DelegateNotAllowed { .. }));
}
