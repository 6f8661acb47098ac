// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The `reflect!` macro: member-table generation for plain structs.

/// Generate [`Reflect`](crate::Reflect) and [`Formattable`](crate::Formattable)
/// implementations for an existing struct.
///
/// Each listed member becomes one descriptor; unlisted fields never
/// participate in serialization. Options go in brackets after the member
/// type, separated by commas:
///
/// - `alias "name"` — persistent-name override
/// - `alt ["a", "b"]` — alternative names for read-side reconciliation
/// - `property` — accessor-backed member rather than a plain field
/// - `readonly`, `synthetic`, `non_serialized`, `private`
/// - `include`, `exclude` — member-level attributes
///
/// # Example
///
/// ```
/// use strata::reflect;
///
/// #[derive(Default, Debug, PartialEq)]
/// struct Player {
///     name: String,
///     level: u32,
/// }
///
/// reflect! {
///     struct Player("Player") {
///         name: String,
///         level: u32 [alias "lvl", alt ["level"]],
///     }
/// }
/// ```
#[macro_export]
macro_rules! reflect {
    (struct $t:ident ($pname:literal) {
        $( $m:ident : $ty:ty $( [ $($opt:tt)* ] )? ),* $(,)?
    }) => {
        impl $crate::Reflect for $t {
            fn type_name() -> &'static str {
                $pname
            }

            fn members() -> ::std::vec::Vec<$crate::MemberDescriptor<Self>> {
                ::std::vec![
                    $( {
                        #[allow(unused_mut)]
                        let mut d = $crate::MemberDescriptor::<$t>::field::<$ty>(
                            ::core::stringify!($m),
                            |v: &$t| &v.$m,
                            |v: &mut $t| &mut v.$m,
                        );
                        $( $crate::reflect!(@opts d $($opt)*); )?
                        d
                    } ),*
                ]
            }
        }

        impl $crate::Formattable for $t {
            fn formatter(
                engine: &$crate::Engine,
            ) -> $crate::Result<::std::sync::Arc<dyn $crate::Formatter<Self>>> {
                engine.reflected_formatter::<Self>()
            }
        }
    };

    // Option munchers. Each consumes one option and recurses on the rest.
    (@opts $d:ident) => {};
    (@opts $d:ident , $($rest:tt)*) => { $crate::reflect!(@opts $d $($rest)*); };
    (@opts $d:ident alias $v:literal $($rest:tt)*) => {
        $d = $d.alias($v);
        $crate::reflect!(@opts $d $($rest)*);
    };
    (@opts $d:ident alt [$($v:literal),* $(,)?] $($rest:tt)*) => {
        $d = $d.alt_names(&[$($v),*]);
        $crate::reflect!(@opts $d $($rest)*);
    };
    (@opts $d:ident property $($rest:tt)*) => {
        $d = $d.as_property();
        $crate::reflect!(@opts $d $($rest)*);
    };
    (@opts $d:ident readonly $($rest:tt)*) => {
        $d = $d.readonly();
        $crate::reflect!(@opts $d $($rest)*);
    };
    (@opts $d:ident synthetic $($rest:tt)*) => {
        $d = $d.synthetic();
        $crate::reflect!(@opts $d $($rest)*);
    };
    (@opts $d:ident non_serialized $($rest:tt)*) => {
        $d = $d.non_serialized();
        $crate::reflect!(@opts $d $($rest)*);
    };
    (@opts $d:ident private $($rest:tt)*) => {
        $d = $d.private();
        $crate::reflect!(@opts $d $($rest)*);
    };
    (@opts $d:ident include $($rest:tt)*) => {
        $d = $d.include();
        $crate::reflect!(@opts $d $($rest)*);
    };
    (@opts $d:ident exclude $($rest:tt)*) => {
        $d = $d.exclude();
        $crate::reflect!(@opts $d $($rest)*);
    };
}
