//! Fixed-scale 128-bit decimal codec.
//!
//! The wire format is a signed 128-bit two's-complement integer equal to
//! the decimal value multiplied by 10^12 (scale fixed at 12, up to 26
//! digits before the point). `rust_decimal::Decimal` is the natural choice
//! for *application-level* decimal arithmetic in this codebase's ecosystem,
//! but its mantissa only holds 96 bits, not enough to carry this
//! protocol's full 38-digit range bit-exactly. [`Decimal`] here is a thin
//! i128-backed fixed-point value that speaks the wire format directly and
//! interconverts with `rust_decimal::Decimal` whenever a value's magnitude
//! actually fits (see [`Decimal::to_rust_decimal`]).

use crate::error::{DecodeError, EncodeError};
use bytes::{BufMut, BytesMut};

/// Digits to the right of the decimal point; fixed by the protocol.
pub const SCALE: u32 = 12;
/// Maximum digits to the left of the decimal point.
pub const MAX_INTEGER_DIGITS: u32 = 26;
const SCALE_FACTOR: i128 = 1_000_000_000_000; // 10^12
/// All-bits sentinel for a null decimal: the minimum i128, i.e. -2^127.
const NULL_SENTINEL: i128 = i128::MIN;

/// A fixed-point decimal scaled by exactly 10^-12, matching the wire format
/// bit for bit. Never round-trips through a float.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decimal {
    unscaled: i128,
}

impl Decimal {
    /// Build from a raw unscaled i128 (i.e. `value * 10^12`), validating
    /// that the integer part stays within [`MAX_INTEGER_DIGITS`].
    pub fn from_unscaled(unscaled: i128) -> Result<Self, EncodeError> {
        let integer_part = unscaled / SCALE_FACTOR;
        let digits = count_digits(integer_part.unsigned_abs());
        if digits > MAX_INTEGER_DIGITS {
            return Err(EncodeError::Precision(digits));
        }
        Ok(Self { unscaled })
    }

    /// Parse a base-10 literal such as `"12345.678901234"` or `"-1"`.
    /// Rejects more than 12 fractional digits with `EncodeError::Scale` and
    /// more than 26 integer digits with `EncodeError::Precision`.
    pub fn parse(s: &str) -> Result<Self, EncodeError> {
        let s = s.trim();
        let (neg, s) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };

        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };

        if frac_part.len() as u32 > SCALE {
            return Err(EncodeError::Scale(frac_part.len() as u32));
        }
        let int_digits = int_part.trim_start_matches('0').len().max(if int_part.is_empty() { 0 } else { 1 });
        if int_digits as u32 > MAX_INTEGER_DIGITS {
            return Err(EncodeError::Precision(int_digits as u32));
        }

        let mut padded_frac = frac_part.to_string();
        while padded_frac.len() < SCALE as usize {
            padded_frac.push('0');
        }

        let int_val: i128 = if int_part.is_empty() { 0 } else { int_part.parse().unwrap_or(0) };
        let frac_val: i128 = if padded_frac.is_empty() { 0 } else { padded_frac.parse().unwrap_or(0) };

        let mut unscaled = int_val * SCALE_FACTOR + frac_val;
        if neg {
            unscaled = -unscaled;
        }
        Ok(Self { unscaled })
    }

    /// The raw unscaled i128 value (`decimal_value * 10^12`).
    pub fn unscaled(&self) -> i128 {
        self.unscaled
    }

    /// Render back to a base-10 literal with exactly 12 fractional digits.
    pub fn to_fixed_string(&self) -> String {
        let neg = self.unscaled < 0;
        let magnitude = self.unscaled.unsigned_abs();
        let int_part = magnitude / SCALE_FACTOR as u128;
        let frac_part = magnitude % SCALE_FACTOR as u128;
        format!("{}{}.{:012}", if neg { "-" } else { "" }, int_part, frac_part)
    }

    /// Convert to `rust_decimal::Decimal`, when the value's magnitude fits
    /// in that type's 96-bit mantissa. Returns `None` for the rare values
    /// at the edge of this protocol's wider 128-bit range.
    pub fn to_rust_decimal(&self) -> Option<rust_decimal::Decimal> {
        rust_decimal::Decimal::try_from_i128_with_scale(self.unscaled, SCALE).ok()
    }

    /// Convert from `rust_decimal::Decimal`. Rejects a value already
    /// carrying more than 12 fractional digits with `EncodeError::Scale`
    /// rather than silently rounding it down to fit.
    pub fn from_rust_decimal(d: rust_decimal::Decimal) -> Result<Self, EncodeError> {
        if d.scale() > SCALE {
            return Err(EncodeError::Scale(d.scale()));
        }
        let mut d = d;
        d.rescale(SCALE);
        Self::from_unscaled(d.mantissa())
    }
}

fn count_digits(mut v: u128) -> u32 {
    if v == 0 {
        return 0;
    }
    let mut n = 0;
    while v > 0 {
        n += 1;
        v /= 10;
    }
    n
}

pub fn read_decimal(r: &mut super::Reader) -> Result<Option<Decimal>, DecodeError> {
    let bytes = r.take(16, "decimal")?;
    let unscaled = i128::from_be_bytes(bytes.try_into().unwrap());
    if unscaled == NULL_SENTINEL {
        return Ok(None);
    }
    Ok(Some(Decimal { unscaled }))
}

pub fn write_decimal(buf: &mut BytesMut, v: Option<Decimal>) {
    let unscaled = v.map(|d| d.unscaled).unwrap_or(NULL_SENTINEL);
    buf.put_i128(unscaled);
}

/// The decimal-string variant: same numeric domain, reuses the string codec.
pub fn read_decimal_string(r: &mut super::Reader) -> Result<Option<Decimal>, DecodeError> {
    let Some(s) = super::scalar::read_string(r)? else {
        return Ok(None);
    };
    Decimal::parse(&s).map(Some).map_err(|_| DecodeError::Frame { context: "decimal string" })
}

pub fn write_decimal_string(buf: &mut BytesMut, v: Option<&Decimal>) {
    super::scalar::write_string(buf, v.map(|d| d.to_fixed_string()).as_deref());
}
