//! Sign/magnitude re-encoding between point-transform domains.
//!
//! Operates in place over 32-bit line words. Float samples live in the same
//! words as f32 bit patterns — the codec line-buffer convention — so each
//! direction is a pure word-to-word rewrite at a given bit precision `P`
//! (`1 ≤ P ≤ 32`), with `min = -2^(P-1)` and `max = -min - 1`:
//!
//! - `*_from_float` (synthesis): scale by `2^P`, clamp to `[min, max]`,
//!   convert with round-to-nearest-even forced for the duration of the
//!   call, then — for the signed variant only — re-encode negatives as
//!   one's-complement-style sign-magnitude.
//! - `*_to_float` (analysis): decode and inverse-scale by `2^-P`.
//! - `*_reclamp`: plain integer clamp to the precision range.
//!
//! The unsigned (`umag`) variants clamp to `[0, 2^P - 1]` with no sign
//! manipulation.

use bytemuck::cast;
use wide::{f32x8, i32x8, CmpLt};

use crate::fixed::floor_bound_f32;
use crate::rounding::NearestEvenGuard;
use crate::targets::{kernel_set, tier_clone};

/// In-place word transform at a caller-supplied bit precision.
pub type MagFn = fn(&mut [i32], u32);

/// Re-encode a two's-complement value as sign-magnitude.
///
/// Negatives become `(one's complement of v) | sign bit`; non-negatives
/// pass through.
#[inline(always)]
pub fn smag_encode(v: i32) -> i32 {
    let mask = v >> 31;
    (v ^ mask) | (mask & i32::MIN)
}

/// Inverse of [`smag_encode`].
#[inline(always)]
pub fn smag_decode(w: i32) -> i32 {
    (w & 0x7fff_ffff) ^ (w >> 31)
}

#[inline(always)]
fn signed_min(precision: u32) -> i64 {
    debug_assert!((1..=32).contains(&precision));
    -(1i64 << (precision - 1))
}

// ============================================================================
// Bodies
// ============================================================================

#[inline(always)]
fn smag_from_float_body(line: &mut [i32], precision: u32) {
    let _guard = NearestEvenGuard::new();
    let scale = 2f32.powi(precision as i32);
    let min_i = signed_min(precision);
    let lo = min_i as f32;
    let hi = floor_bound_f32(-min_i - 1);
    for w in line.iter_mut() {
        let x = f32::from_bits(*w as u32) * scale;
        let v = x.clamp(lo, hi).round_ties_even() as i32;
        *w = smag_encode(v);
    }
}

#[inline(always)]
fn smag_from_float_x8(line: &mut [i32], precision: u32) {
    let _guard = NearestEvenGuard::new();
    let scale = f32x8::splat(2f32.powi(precision as i32));
    let min_i = signed_min(precision);
    let lo = f32x8::splat(min_i as f32);
    let hi = f32x8::splat(floor_bound_f32(-min_i - 1));
    let sign_bit = i32x8::splat(i32::MIN);
    let zero = i32x8::splat(0);

    let (chunks, rest) = line.as_chunks_mut::<8>();
    debug_assert!(rest.is_empty());
    for c in chunks.iter_mut() {
        let x: f32x8 = cast(i32x8::from(*c));
        let v = (x * scale).max(lo).min(hi).round_int();
        let mask = v.cmp_lt(zero);
        let encoded = (v ^ mask) | (mask & sign_bit);
        *c = encoded.into();
    }
}

#[inline(always)]
fn smag_to_float_body(line: &mut [i32], precision: u32) {
    debug_assert!((1..=32).contains(&precision));
    let inv = 2f32.powi(-(precision as i32));
    for w in line.iter_mut() {
        let v = smag_decode(*w);
        *w = ((v as f32) * inv).to_bits() as i32;
    }
}

#[inline(always)]
fn smag_reclamp_body(line: &mut [i32], precision: u32) {
    let min_i = signed_min(precision);
    let (lo, hi) = (min_i as i32, (-min_i - 1) as i32);
    for w in line.iter_mut() {
        *w = (*w).clamp(lo, hi);
    }
}

#[inline(always)]
fn umag_from_float_body(line: &mut [i32], precision: u32) {
    debug_assert!((1..=32).contains(&precision));
    let _guard = NearestEvenGuard::new();
    let scale = 2f32.powi(precision as i32);
    let hi = floor_bound_f32((1i64 << precision) - 1);
    for w in line.iter_mut() {
        let x = f32::from_bits(*w as u32) * scale;
        let v = x.clamp(0.0, hi).round_ties_even() as u32;
        *w = v as i32;
    }
}

#[inline(always)]
fn umag_to_float_body(line: &mut [i32], precision: u32) {
    debug_assert!((1..=32).contains(&precision));
    let inv = 2f32.powi(-(precision as i32));
    for w in line.iter_mut() {
        *w = (((*w as u32) as f32) * inv).to_bits() as i32;
    }
}

#[inline(always)]
fn umag_reclamp_body(line: &mut [i32], precision: u32) {
    debug_assert!((1..=32).contains(&precision));
    let hi = ((1u64 << precision) - 1).min(u32::MAX as u64) as u32;
    for w in line.iter_mut() {
        *w = (*w as u32).min(hi) as i32;
    }
}

// ============================================================================
// Scalar references
// ============================================================================

/// Float words → sign-magnitude integers at `precision` bits.
pub fn smag_from_float(line: &mut [i32], precision: u32) {
    smag_from_float_body(line, precision);
}

/// Sign-magnitude integers → float words.
pub fn smag_to_float(line: &mut [i32], precision: u32) {
    smag_to_float_body(line, precision);
}

/// Clamp plain signed words to the `precision`-bit range.
pub fn smag_reclamp(line: &mut [i32], precision: u32) {
    smag_reclamp_body(line, precision);
}

/// Float words → unsigned integers at `precision` bits.
pub fn umag_from_float(line: &mut [i32], precision: u32) {
    umag_from_float_body(line, precision);
}

/// Unsigned integers → float words.
pub fn umag_to_float(line: &mut [i32], precision: u32) {
    umag_to_float_body(line, precision);
}

/// Clamp unsigned words to the `precision`-bit range.
pub fn umag_reclamp(line: &mut [i32], precision: u32) {
    umag_reclamp_body(line, precision);
}

// ============================================================================
// Tier clones and candidate tables
// ============================================================================

tier_clone!(x86 "ssse3,sse4.1", fn smag_from_float_v128(line: &mut [i32], precision: u32) = smag_from_float_body);
tier_clone!(x86 "avx,avx2,fma", fn smag_from_float_v256(line: &mut [i32], precision: u32) = smag_from_float_x8);
tier_clone!(aarch64 fn smag_from_float_neon(line: &mut [i32], precision: u32) = smag_from_float_body);

tier_clone!(x86 "ssse3,sse4.1", fn smag_to_float_v128(line: &mut [i32], precision: u32) = smag_to_float_body);
tier_clone!(x86 "avx,avx2,fma", fn smag_to_float_v256(line: &mut [i32], precision: u32) = smag_to_float_body);
tier_clone!(aarch64 fn smag_to_float_neon(line: &mut [i32], precision: u32) = smag_to_float_body);

tier_clone!(x86 "ssse3,sse4.1", fn smag_reclamp_v128(line: &mut [i32], precision: u32) = smag_reclamp_body);
tier_clone!(x86 "avx,avx2,fma", fn smag_reclamp_v256(line: &mut [i32], precision: u32) = smag_reclamp_body);
tier_clone!(aarch64 fn smag_reclamp_neon(line: &mut [i32], precision: u32) = smag_reclamp_body);

tier_clone!(x86 "ssse3,sse4.1", fn umag_from_float_v128(line: &mut [i32], precision: u32) = umag_from_float_body);
tier_clone!(x86 "avx,avx2,fma", fn umag_from_float_v256(line: &mut [i32], precision: u32) = umag_from_float_body);
tier_clone!(aarch64 fn umag_from_float_neon(line: &mut [i32], precision: u32) = umag_from_float_body);

tier_clone!(x86 "ssse3,sse4.1", fn umag_to_float_v128(line: &mut [i32], precision: u32) = umag_to_float_body);
tier_clone!(x86 "avx,avx2,fma", fn umag_to_float_v256(line: &mut [i32], precision: u32) = umag_to_float_body);
tier_clone!(aarch64 fn umag_to_float_neon(line: &mut [i32], precision: u32) = umag_to_float_body);

tier_clone!(x86 "ssse3,sse4.1", fn umag_reclamp_v128(line: &mut [i32], precision: u32) = umag_reclamp_body);
tier_clone!(x86 "avx,avx2,fma", fn umag_reclamp_v256(line: &mut [i32], precision: u32) = umag_reclamp_body);
tier_clone!(aarch64 fn umag_reclamp_neon(line: &mut [i32], precision: u32) = umag_reclamp_body);

kernel_set! {
    /// Synthesis-direction signed conversion.
    pub static SMAG_FROM_FLOAT: crate::smag::MagFn = {
        name: "smag_from_float",
        reference: smag_from_float,
        x86: [(V256, 8, smag_from_float_v256), (V128, 8, smag_from_float_v128)],
        aarch64: [(V128, 4, smag_from_float_neon)],
    };
}

kernel_set! {
    /// Analysis-direction signed conversion.
    pub static SMAG_TO_FLOAT: crate::smag::MagFn = {
        name: "smag_to_float",
        reference: smag_to_float,
        x86: [(V256, 8, smag_to_float_v256), (V128, 8, smag_to_float_v128)],
        aarch64: [(V128, 4, smag_to_float_neon)],
    };
}

kernel_set! {
    /// Signed-range re-clamp.
    pub static SMAG_RECLAMP: crate::smag::MagFn = {
        name: "smag_reclamp",
        reference: smag_reclamp,
        x86: [(V256, 8, smag_reclamp_v256), (V128, 8, smag_reclamp_v128)],
        aarch64: [(V128, 4, smag_reclamp_neon)],
    };
}

kernel_set! {
    /// Synthesis-direction unsigned conversion.
    pub static UMAG_FROM_FLOAT: crate::smag::MagFn = {
        name: "umag_from_float",
        reference: umag_from_float,
        x86: [(V256, 8, umag_from_float_v256), (V128, 8, umag_from_float_v128)],
        aarch64: [(V128, 4, umag_from_float_neon)],
    };
}

kernel_set! {
    /// Analysis-direction unsigned conversion.
    pub static UMAG_TO_FLOAT: crate::smag::MagFn = {
        name: "umag_to_float",
        reference: umag_to_float,
        x86: [(V256, 8, umag_to_float_v256), (V128, 8, umag_to_float_v128)],
        aarch64: [(V128, 4, umag_to_float_neon)],
    };
}

kernel_set! {
    /// Unsigned-range re-clamp.
    pub static UMAG_RECLAMP: crate::smag::MagFn = {
        name: "umag_reclamp",
        reference: umag_reclamp,
        x86: [(V256, 8, umag_reclamp_v256), (V128, 8, umag_reclamp_v128)],
        aarch64: [(V128, 4, umag_reclamp_neon)],
    };
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_roundtrip() {
        for v in [-1i32, 0, 1, 127, -128, 32_767, -32_768, i32::MAX, i32::MIN + 1] {
            assert_eq!(smag_decode(smag_encode(v)), v, "v={}", v);
        }
    }

    #[test]
    fn encode_is_ones_complement_style() {
        // -1 maps to sign bit with zero magnitude field.
        assert_eq!(smag_encode(-1), i32::MIN);
        assert_eq!(smag_encode(-2), i32::MIN | 1);
        assert_eq!(smag_encode(5), 5);
    }

    #[test]
    fn smag_roundtrip_p8_is_exact() {
        // Every 8-bit value survives int -> float -> int.
        let mut line: Vec<i32> = (-128..=127).map(smag_encode).collect();
        let expected = line.clone();
        smag_to_float(&mut line, 8);
        smag_from_float(&mut line, 8);
        assert_eq!(line, expected);
    }

    #[test]
    fn umag_roundtrip_p8_is_exact() {
        let mut line: Vec<i32> = (0..=255).collect();
        let expected = line.clone();
        umag_to_float(&mut line, 8);
        umag_from_float(&mut line, 8);
        assert_eq!(line, expected);
    }

    #[test]
    fn from_float_clamps_out_of_range() {
        let mut line = vec![
            10.0f32.to_bits() as i32,   // far above +max at P=4
            (-10.0f32).to_bits() as i32, // far below -min
        ];
        smag_from_float(&mut line, 4);
        assert_eq!(smag_decode(line[0]), 7, "clamped to 2^(P-1)-1");
        assert_eq!(smag_decode(line[1]), -8, "clamped to -2^(P-1)");
    }

    #[test]
    fn from_float_rounds_ties_to_even() {
        let mut line = vec![1.25f32.to_bits() as i32];
        smag_from_float(&mut line, 1);
        // 1.25 * 2 = 2.5 clamps to max = 0 before conversion.
        assert_eq!(smag_decode(line[0]), 0);

        let mut line = vec![0.3125f32.to_bits() as i32];
        smag_from_float(&mut line, 3);
        // 0.3125 * 8 = 2.5 rounds to 2 (even), inside range at P=3.
        assert_eq!(smag_decode(line[0]), 2);
    }

    #[test]
    fn reclamp_signed_and_unsigned() {
        let mut line = vec![300i32, -300, 5, -5];
        smag_reclamp(&mut line, 8);
        assert_eq!(line, vec![127, -128, 5, -5]);

        let mut line = vec![300i32, 5];
        umag_reclamp(&mut line, 8);
        assert_eq!(line, vec![255, 5]);
    }

    #[test]
    fn x8_body_matches_scalar() {
        let mut scalar: Vec<i32> = (0..64)
            .map(|i| ((i as f32 - 31.5) / 13.0).to_bits() as i32)
            .collect();
        let mut vector = scalar.clone();
        smag_from_float_body(&mut scalar, 6);
        smag_from_float_x8(&mut vector, 6);
        assert_eq!(scalar, vector);
    }

    #[test]
    fn extreme_precisions() {
        // P=1 and P=32 must not overflow internally.
        let mut line = vec![0.4f32.to_bits() as i32, (-0.6f32).to_bits() as i32];
        smag_from_float(&mut line, 1);
        assert_eq!(smag_decode(line[0]), 0);
        assert_eq!(smag_decode(line[1]), -1);

        let mut line = vec![0.25f32.to_bits() as i32];
        smag_from_float(&mut line, 32);
        assert_eq!(smag_decode(line[0]), 1 << 30);
    }
}
