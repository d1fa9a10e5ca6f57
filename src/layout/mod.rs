//! Binary layouts of the Assetto Corsa shared memory pages.
//!
//! The simulator publishes three C structs compiled with `#pragma pack(4)`.
//! Instead of overlaying `#[repr(C)]` structs on foreign memory, every record
//! is declared as an ordered field table and decoded by a cursor that applies
//! the packing rules explicitly:
//!
//! - each field starts at a multiple of `min(natural alignment, 4)`
//! - the record size is rounded up to its largest field alignment
//! - all numbers are little-endian
//!
//! Field kinds are `i32`, `f32`, fixed-length UTF-16 text ([`WideStr`]) and
//! fixed-length arrays of those. Decoding a correctly sized buffer never
//! fails and never interprets values; a buffer of any other size is rejected
//! with [`BridgeError::Layout`](crate::BridgeError::Layout).
//!
//! ```rust
//! use ac_bridge::layout::{PhysicsRecord, Record};
//!
//! let mut physics = PhysicsRecord::zeroed();
//! physics.speed_kmh = 123.4;
//! physics.gear = 3;
//!
//! let bytes = physics.encode();
//! assert_eq!(bytes.len(), PhysicsRecord::SIZE);
//! assert_eq!(PhysicsRecord::decode(&bytes).unwrap(), physics);
//! ```

mod graphics;
mod physics;
mod static_info;
mod wide_str;

pub use graphics::{FlagType, GraphicsRecord, SessionType, SimStatus};
pub use physics::PhysicsRecord;
pub use static_info::StaticRecord;
pub use wide_str::WideStr;

use crate::{BridgeError, Region, Result};

/// Largest alignment any field may require under `#pragma pack(4)`.
pub const PACK: usize = 4;

/// A value with a fixed binary representation inside a record.
pub trait Field: Sized {
    /// Encoded size in bytes.
    const SIZE: usize;
    /// Natural alignment before packing is applied.
    const ALIGN: usize;

    fn read(cursor: &mut Cursor<'_>) -> Self;
    fn write(&self, writer: &mut Writer<'_>);
    fn zeroed() -> Self;
}

impl Field for i32 {
    const SIZE: usize = 4;
    const ALIGN: usize = 4;

    fn read(cursor: &mut Cursor<'_>) -> Self {
        i32::from_le_bytes(cursor.take())
    }

    fn write(&self, writer: &mut Writer<'_>) {
        writer.put(&self.to_le_bytes());
    }

    fn zeroed() -> Self {
        0
    }
}

impl Field for f32 {
    const SIZE: usize = 4;
    const ALIGN: usize = 4;

    fn read(cursor: &mut Cursor<'_>) -> Self {
        f32::from_le_bytes(cursor.take())
    }

    fn write(&self, writer: &mut Writer<'_>) {
        writer.put(&self.to_le_bytes());
    }

    fn zeroed() -> Self {
        0.0
    }
}

impl Field for u16 {
    const SIZE: usize = 2;
    const ALIGN: usize = 2;

    fn read(cursor: &mut Cursor<'_>) -> Self {
        u16::from_le_bytes(cursor.take())
    }

    fn write(&self, writer: &mut Writer<'_>) {
        writer.put(&self.to_le_bytes());
    }

    fn zeroed() -> Self {
        0
    }
}

// Element sizes are always a multiple of their alignment, so array elements
// are contiguous.
impl<T: Field, const N: usize> Field for [T; N] {
    const SIZE: usize = T::SIZE * N;
    const ALIGN: usize = T::ALIGN;

    fn read(cursor: &mut Cursor<'_>) -> Self {
        std::array::from_fn(|_| T::read(cursor))
    }

    fn write(&self, writer: &mut Writer<'_>) {
        for item in self {
            item.write(writer);
        }
    }

    fn zeroed() -> Self {
        std::array::from_fn(|_| T::zeroed())
    }
}

/// Alignment of a field inside a packed record.
pub const fn packed_align(align: usize) -> usize {
    if align < PACK { align } else { PACK }
}

const fn align_up(offset: usize, align: usize) -> usize {
    offset.div_ceil(align) * align
}

/// Total size of a packed record from its `(size, align)` field list.
pub const fn packed_size(fields: &[(usize, usize)]) -> usize {
    let mut offset = 0;
    let mut record_align = 1;
    let mut i = 0;
    while i < fields.len() {
        let (size, align) = fields[i];
        let align = packed_align(align);
        offset = align_up(offset, align) + size;
        if align > record_align {
            record_align = align;
        }
        i += 1;
    }
    align_up(offset, record_align)
}

/// Position and width of one field inside a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name as published in the simulator's C headers.
    pub name: &'static str,
    pub offset: usize,
    pub size: usize,
}

/// Builds the field table of a record in declaration order.
#[derive(Debug, Default)]
pub struct LayoutTable {
    fields: Vec<FieldSpec>,
    offset: usize,
}

impl LayoutTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: &'static str, size: usize, align: usize) {
        let offset = align_up(self.offset, packed_align(align));
        self.fields.push(FieldSpec { name, offset, size });
        self.offset = offset + size;
    }

    pub fn finish(self) -> Vec<FieldSpec> {
        self.fields
    }
}

/// Reads fields sequentially from a record buffer.
///
/// Reads past the end yield zero bytes; record decoders check the buffer
/// size up front so this never happens for a decoded record.
pub struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Reads the next field, skipping packing padding first.
    pub fn field<T: Field>(&mut self) -> T {
        self.pos = align_up(self.pos, packed_align(T::ALIGN));
        T::read(self)
    }

    pub fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        if let Some(src) = self.bytes.get(self.pos..self.pos + N) {
            out.copy_from_slice(src);
        }
        self.pos += N;
        out
    }

    pub fn position(&self) -> usize {
        self.pos
    }
}

/// Writes fields sequentially into a zero-initialised record buffer.
pub struct Writer<'a> {
    bytes: &'a mut [u8],
    pos: usize,
}

impl<'a> Writer<'a> {
    pub fn new(bytes: &'a mut [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Writes the next field, leaving packing padding untouched.
    pub fn field<T: Field>(&mut self, value: &T) {
        self.pos = align_up(self.pos, packed_align(T::ALIGN));
        value.write(self);
    }

    pub fn put(&mut self, src: &[u8]) {
        if let Some(dst) = self.bytes.get_mut(self.pos..self.pos + src.len()) {
            dst.copy_from_slice(src);
        }
        self.pos += src.len();
    }
}

/// A fixed-size record stored in one shared memory region.
pub trait Record: Sized + Send + 'static {
    /// Region the simulator publishes this record in.
    const REGION: Region;
    /// Exact byte size of the record, padding included.
    const SIZE: usize;

    /// Field table in declaration order.
    fn fields() -> Vec<FieldSpec>;

    /// Decode a record from a buffer of exactly [`Record::SIZE`] bytes.
    fn decode(bytes: &[u8]) -> Result<Self>;

    /// Encode the record into a new buffer; padding bytes are zero.
    fn encode(&self) -> Vec<u8>;

    /// A record with every field zeroed.
    fn zeroed() -> Self;

    /// Looks up a field by its published name.
    fn field(name: &str) -> Option<FieldSpec> {
        Self::fields().into_iter().find(|spec| spec.name == name)
    }
}

pub(crate) fn check_size(region: Region, expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(BridgeError::layout(region, expected, found));
    }
    Ok(())
}

/// Declares a record struct together with its field table and codec.
///
/// Each field names its Rust identifier, its type and the field name used
/// by the simulator's C headers. Declaration order is the binary order.
macro_rules! layout_record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident in $region:path {
            $(
                $(#[$field_meta:meta])*
                $field:ident: $ty:ty => $abi:literal,
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                pub $field: $ty,
            )*
        }

        impl $crate::layout::Record for $name {
            const REGION: $crate::Region = $region;
            const SIZE: usize = $crate::layout::packed_size(&[
                $( (<$ty as $crate::layout::Field>::SIZE, <$ty as $crate::layout::Field>::ALIGN), )*
            ]);

            fn fields() -> Vec<$crate::layout::FieldSpec> {
                let mut table = $crate::layout::LayoutTable::new();
                $(
                    table.push(
                        $abi,
                        <$ty as $crate::layout::Field>::SIZE,
                        <$ty as $crate::layout::Field>::ALIGN,
                    );
                )*
                table.finish()
            }

            fn decode(bytes: &[u8]) -> $crate::Result<Self> {
                $crate::layout::check_size(Self::REGION, Self::SIZE, bytes.len())?;
                let mut cursor = $crate::layout::Cursor::new(bytes);
                Ok(Self {
                    $( $field: cursor.field::<$ty>(), )*
                })
            }

            fn encode(&self) -> Vec<u8> {
                let mut bytes = vec![0u8; Self::SIZE];
                let mut writer = $crate::layout::Writer::new(&mut bytes);
                $( writer.field(&self.$field); )*
                bytes
            }

            fn zeroed() -> Self {
                Self {
                    $( $field: <$ty as $crate::layout::Field>::zeroed(), )*
                }
            }
        }
    };
}

pub(crate) use layout_record;
