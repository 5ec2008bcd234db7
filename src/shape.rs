//! # Destination Shapes
//!
//! A destination's *shape* is the static description the analyzer walks to
//! build a decoding plan: which fields exist, at which byte offsets, and
//! whether each is a scalar leaf, an embedded record, or a pointer hop.
//!
//! Shapes are produced by [`Destination::shape`]. Scalar types return
//! [`Shape::Scalar`]; `Box<T>` and `Option<Box<T>>` return
//! [`Shape::Pointer`]; record types return [`Shape::Record`] with a
//! `'static` table of field metadata. User records get their
//! implementation from the [`destination!`](crate::destination) macro,
//! which computes field offsets with `core::mem::offset_of!` at compile
//! time. This is the moral equivalent of the reflection walk a dynamic
//! language would do per shape, done once by the compiler instead.
//!
//! ## Safety
//!
//! `Destination` is an `unsafe` trait: the decoder trusts the returned
//! shape enough to write through raw pointers computed from the recorded
//! offsets. An implementation must describe `Self`'s actual layout, with
//! every listed offset in bounds and typed as declared.

use crate::types::{Nullable, RawBytes, Timestamp};

/// The scalar kinds a leaf column can decode into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    IWord,
    U8,
    U16,
    U32,
    U64,
    UWord,
    F32,
    F64,
    Str,
    Bytes,
    Raw,
    Time,
}

/// Static description of one record field.
pub struct FieldDef {
    /// Field name as declared, used for dotted error paths.
    pub name: &'static str,
    /// Declared type, used in unsupported-type diagnostics.
    pub type_name: &'static str,
    /// Byte offset of the field within the record.
    pub offset: usize,
    /// Shape of the field's type.
    pub shape: fn() -> Shape,
}

/// Static description of a record destination.
pub struct RecordLayout {
    pub type_name: &'static str,
    /// Fields in declaration order; column order follows this.
    pub fields: &'static [FieldDef],
}

/// What the analyzer sees when it looks at a destination type.
pub enum Shape {
    /// A terminal column. `nullable` marks the `Nullable<K>` wrapper.
    Scalar { kind: ScalarKind, nullable: bool },
    /// A record whose fields are flattened into the plan.
    Record(&'static RecordLayout),
    /// A single-level pointer (`Box<T>` / `Option<Box<T>>`) to the inner
    /// shape. Pointers to pointers are rejected by the analyzer.
    Pointer(fn() -> Shape),
}

/// A type that can receive decoded column data.
///
/// # Safety
///
/// `shape()` must faithfully describe `Self`'s memory layout. For records
/// every `FieldDef.offset` must be the real offset of a field of the
/// declared type; for scalars the type's layout must be exactly the named
/// kind. The row decoder writes through raw pointers derived from this
/// metadata.
pub unsafe trait Destination: 'static {
    fn shape() -> Shape;
}

mod sealed {
    pub trait Sealed {}
}

/// Scalar types that may sit inside [`Nullable`]. Sealed: the converter
/// table only covers the kinds listed in [`ScalarKind`].
pub trait ScalarValue: sealed::Sealed + 'static {
    const KIND: ScalarKind;
}

macro_rules! scalar_shapes {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            unsafe impl Destination for $ty {
                fn shape() -> Shape {
                    Shape::Scalar {
                        kind: ScalarKind::$kind,
                        nullable: false,
                    }
                }
            }

            impl sealed::Sealed for $ty {}

            impl ScalarValue for $ty {
                const KIND: ScalarKind = ScalarKind::$kind;
            }
        )*
    };
}

scalar_shapes! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => IWord,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => UWord,
    f32 => F32,
    f64 => F64,
    String => Str,
    Vec<u8> => Bytes,
    RawBytes => Raw,
    Timestamp => Time,
}

unsafe impl<K: ScalarValue> Destination for Nullable<K> {
    fn shape() -> Shape {
        Shape::Scalar {
            kind: K::KIND,
            nullable: true,
        }
    }
}

// Box<T> is never null; Option<Box<T>> uses the guaranteed null-pointer
// niche, so both read as a plain pointer word at the field offset.
unsafe impl<T: Destination> Destination for Box<T> {
    fn shape() -> Shape {
        Shape::Pointer(T::shape)
    }
}

unsafe impl<T: Destination> Destination for Option<Box<T>> {
    fn shape() -> Shape {
        Shape::Pointer(T::shape)
    }
}
