//! # Destination Definition Macros
//!
//! This module provides the macros that generate [`Destination`]
//! implementations for user types.
//!
//! ## destination!
//!
//! Defines one or more record structs together with their layout
//! metadata. The macro records every field's byte offset with
//! `core::mem::offset_of!`, so the shape can never drift from the struct
//! definition it was generated with.
//!
//! ```ignore
//! fastrow::destination! {
//!     #[derive(Default)]
//!     pub struct Book {
//!         pub title: String,
//!         pub year: u16,
//!         pub loans: Option<Box<Loans>>,
//!     }
//!
//!     #[derive(Default)]
//!     pub struct Loans {
//!         pub library_id: i8,
//!         pub loan_data: Vec<u8>,
//!     }
//! }
//! ```
//!
//! ## scalar_newtype!
//!
//! Defines a transparent wrapper over a primitive scalar that decodes as
//! its underlying kind:
//!
//! ```ignore
//! fastrow::scalar_newtype! {
//!     pub struct CardCatalogId(pub u64);
//! }
//! ```
//!
//! Only the primitive kinds are accepted; wrappers over `Timestamp` are
//! not recognized. Layout equivalence is checked at compile time.
//!
//! [`Destination`]: crate::shape::Destination

/// Defines record structs and implements [`Destination`](crate::shape::Destination)
/// for them, recording every field's byte offset and shape.
#[macro_export]
macro_rules! destination {
    ($(
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $fname:ident : $fty:ty
            ),* $(,)?
        }
    )+) => {
        $(
            $(#[$meta])*
            $vis struct $name {
                $(
                    $(#[$fmeta])*
                    $fvis $fname: $fty,
                )*
            }

            unsafe impl $crate::shape::Destination for $name {
                fn shape() -> $crate::shape::Shape {
                    static LAYOUT: $crate::shape::RecordLayout = $crate::shape::RecordLayout {
                        type_name: ::core::stringify!($name),
                        fields: &[
                            $(
                                $crate::shape::FieldDef {
                                    name: ::core::stringify!($fname),
                                    type_name: ::core::stringify!($fty),
                                    offset: ::core::mem::offset_of!($name, $fname),
                                    shape: <$fty as $crate::shape::Destination>::shape,
                                },
                            )*
                        ],
                    };
                    $crate::shape::Shape::Record(&LAYOUT)
                }
            }
        )+
    };
}

/// Defines a newtype over a primitive scalar that decodes as the
/// underlying kind. The wrapped type must be one of the primitive scalar
/// kinds; notably `Timestamp` wrappers are not recognized.
#[macro_export]
macro_rules! scalar_newtype {
    ($(
        $(#[$meta:meta])*
        $vis:vis struct $name:ident($fvis:vis $inner:ident);
    )+) => {
        $(
            $(#[$meta])*
            $vis struct $name($fvis $inner);

            // A single-field struct with identical size and alignment
            // stores its field at offset zero.
            const _: () = {
                assert!(
                    ::core::mem::size_of::<$name>() == ::core::mem::size_of::<$inner>()
                );
                assert!(
                    ::core::mem::align_of::<$name>() == ::core::mem::align_of::<$inner>()
                );
            };

            unsafe impl $crate::shape::Destination for $name {
                fn shape() -> $crate::shape::Shape {
                    $crate::shape::Shape::Scalar {
                        kind: $crate::scalar_newtype!(@kind $inner),
                        nullable: false,
                    }
                }
            }
        )+
    };

    (@kind bool) => { $crate::shape::ScalarKind::Bool };
    (@kind i8) => { $crate::shape::ScalarKind::I8 };
    (@kind i16) => { $crate::shape::ScalarKind::I16 };
    (@kind i32) => { $crate::shape::ScalarKind::I32 };
    (@kind i64) => { $crate::shape::ScalarKind::I64 };
    (@kind isize) => { $crate::shape::ScalarKind::IWord };
    (@kind u8) => { $crate::shape::ScalarKind::U8 };
    (@kind u16) => { $crate::shape::ScalarKind::U16 };
    (@kind u32) => { $crate::shape::ScalarKind::U32 };
    (@kind u64) => { $crate::shape::ScalarKind::U64 };
    (@kind usize) => { $crate::shape::ScalarKind::UWord };
    (@kind f32) => { $crate::shape::ScalarKind::F32 };
    (@kind f64) => { $crate::shape::ScalarKind::F64 };
    (@kind String) => { $crate::shape::ScalarKind::Str };
}
