//! Fixed-length UTF-16 text fields (`wchar_t[N]` on Windows).

use super::{Cursor, Field, Writer};
use std::fmt;

/// A null-padded UTF-16 string of exactly `N` code units.
///
/// All code units are kept, including whatever follows the first NUL, so a
/// decoded record re-encodes to the same bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct WideStr<const N: usize>([u16; N]);

impl<const N: usize> WideStr<N> {
    /// Encodes `text`, truncated so that at least one terminating NUL fits.
    pub fn new(text: &str) -> Self {
        let mut units = [0u16; N];
        for (slot, unit) in units.iter_mut().take(N.saturating_sub(1)).zip(text.encode_utf16()) {
            *slot = unit;
        }
        Self(units)
    }

    pub const fn from_units(units: [u16; N]) -> Self {
        Self(units)
    }

    pub const fn units(&self) -> &[u16; N] {
        &self.0
    }

    /// Text up to the first NUL, with unpaired surrogates replaced.
    pub fn to_string_lossy(&self) -> String {
        let end = self.0.iter().position(|&unit| unit == 0).unwrap_or(N);
        String::from_utf16_lossy(&self.0[..end])
    }

    pub fn is_empty(&self) -> bool {
        self.0.first().is_none_or(|&unit| unit == 0)
    }
}

impl<const N: usize> Field for WideStr<N> {
    const SIZE: usize = 2 * N;
    const ALIGN: usize = 2;

    fn read(cursor: &mut Cursor<'_>) -> Self {
        Self(<[u16; N]>::read(cursor))
    }

    fn write(&self, writer: &mut Writer<'_>) {
        self.0.write(writer);
    }

    fn zeroed() -> Self {
        Self([0; N])
    }
}

impl<const N: usize> From<&str> for WideStr<N> {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl<const N: usize> fmt::Debug for WideStr<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.to_string_lossy(), f)
    }
}

impl<const N: usize> fmt::Display for WideStr<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}
