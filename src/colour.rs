//! Colour-space conversion kernels.
//!
//! Two families, each forward and inverse, each over multiple numeric
//! domains:
//!
//! - **Reversible** (integer lifting): `Y = (2G + R + B) >> 2` with
//!   floor-toward-negative-infinity shifts, `Db = B - G`, `Dr = R - G`.
//!   Losslessly invertible. 16-bit paths saturate every add/sub so
//!   near-extremal inputs clip instead of wrapping; 32-bit paths use
//!   natural arithmetic.
//! - **Irreversible** (real-valued decorrelation): the 0.299/0.587/0.114
//!   luma weights with matched chroma factors, in f32 and in Q15 fixed
//!   point with multiply-high-round products.
//!
//! All kernels are component-major: three equal-length buffers in,
//! transformed in place. Accelerated variants require the line length to be
//! a multiple of their quantum; `resolve` enforces that, and the scalar
//! references accept any length.

use wide::{f32x4, f32x8};

use crate::fixed::{mulhrs, sat_double};
use crate::targets::{kernel_set, tier_clone};

/// In-place transform over three 16-bit component lines.
pub type Lines16Fn = fn(&mut [i16], &mut [i16], &mut [i16]);
/// In-place transform over three 32-bit component lines.
pub type Lines32Fn = fn(&mut [i32], &mut [i32], &mut [i32]);
/// In-place transform over three f32 component lines.
pub type LinesF32Fn = fn(&mut [f32], &mut [f32], &mut [f32]);

// ============================================================================
// Irreversible transform constants
// ============================================================================

const ALPHA_R: f32 = 0.299;
const ALPHA_B: f32 = 0.114;
const ALPHA_G: f32 = 1.0 - ALPHA_R - ALPHA_B;

/// Forward chroma scales: `1 / (2 (1 - alpha))`.
const CB_SCALE: f32 = 1.0 / (2.0 * (1.0 - ALPHA_B));
const CR_SCALE: f32 = 1.0 / (2.0 * (1.0 - ALPHA_R));

/// Inverse factors.
const CR_FACT_R: f32 = 2.0 * (1.0 - ALPHA_R);
const CB_FACT_B: f32 = 2.0 * (1.0 - ALPHA_B);
const CR_FACT_G: f32 = 2.0 * ALPHA_R * (1.0 - ALPHA_R) / ALPHA_G;
const CB_FACT_G: f32 = 2.0 * ALPHA_B * (1.0 - ALPHA_B) / ALPHA_G;

// Q15 renditions of the same constants, `round(c * 2^15)`.
const ALPHA_R_Q15: i16 = 9_798;
const ALPHA_G_Q15: i16 = 19_235;
const ALPHA_B_Q15: i16 = 3_736;
const CB_SCALE_Q15: i16 = 18_492;
const CR_SCALE_Q15: i16 = 23_372;

// Inverse factors exceed 1.0, so they are stored halved (`round(c * 2^14)`)
// and applied to saturating pre-doubled chroma samples.
const CR_FACT_R_Q14: i16 = 22_970;
const CB_FACT_B_Q14: i16 = 29_032;
const CR_FACT_G_Q14: i16 = 11_700;
const CB_FACT_G_Q14: i16 = 5_638;

// ============================================================================
// Reversible (RCT) bodies
// ============================================================================

#[inline(always)]
fn rct_forward_i16_body(c0: &mut [i16], c1: &mut [i16], c2: &mut [i16]) {
    debug_assert!(c0.len() == c1.len() && c1.len() == c2.len());
    for i in 0..c0.len() {
        let (r, g, b) = (c0[i], c1[i], c2[i]);
        let db = b.saturating_sub(g);
        let dr = r.saturating_sub(g);
        // Y = (2G + R + B) >> 2, written in lifting form so the floor shift
        // commutes with the integer G term.
        let y = g.saturating_add(db.saturating_add(dr) >> 2);
        c0[i] = y;
        c1[i] = db;
        c2[i] = dr;
    }
}

#[inline(always)]
fn rct_inverse_i16_body(c0: &mut [i16], c1: &mut [i16], c2: &mut [i16]) {
    debug_assert!(c0.len() == c1.len() && c1.len() == c2.len());
    for i in 0..c0.len() {
        let (y, db, dr) = (c0[i], c1[i], c2[i]);
        let g = y.saturating_sub(db.saturating_add(dr) >> 2);
        let r = dr.saturating_add(g);
        let b = db.saturating_add(g);
        c0[i] = r;
        c1[i] = g;
        c2[i] = b;
    }
}

#[inline(always)]
fn rct_forward_i32_body(c0: &mut [i32], c1: &mut [i32], c2: &mut [i32]) {
    debug_assert!(c0.len() == c1.len() && c1.len() == c2.len());
    for i in 0..c0.len() {
        let (r, g, b) = (c0[i], c1[i], c2[i]);
        let db = b - g;
        let dr = r - g;
        let y = g + ((db + dr) >> 2);
        c0[i] = y;
        c1[i] = db;
        c2[i] = dr;
    }
}

#[inline(always)]
fn rct_inverse_i32_body(c0: &mut [i32], c1: &mut [i32], c2: &mut [i32]) {
    debug_assert!(c0.len() == c1.len() && c1.len() == c2.len());
    for i in 0..c0.len() {
        let (y, db, dr) = (c0[i], c1[i], c2[i]);
        let g = y - ((db + dr) >> 2);
        let r = dr + g;
        let b = db + g;
        c0[i] = r;
        c1[i] = g;
        c2[i] = b;
    }
}

// ============================================================================
// Irreversible (ICT) f32 bodies
// ============================================================================

// The scalar and vector bodies use the same unfused multiply/add expression
// order, so every variant produces bit-identical lanes.

#[inline(always)]
fn ict_forward_f32_body(c0: &mut [f32], c1: &mut [f32], c2: &mut [f32]) {
    debug_assert!(c0.len() == c1.len() && c1.len() == c2.len());
    for i in 0..c0.len() {
        let (r, g, b) = (c0[i], c1[i], c2[i]);
        let y = r * ALPHA_R + g * ALPHA_G + b * ALPHA_B;
        c0[i] = y;
        c1[i] = (b - y) * CB_SCALE;
        c2[i] = (r - y) * CR_SCALE;
    }
}

#[inline(always)]
fn ict_inverse_f32_body(c0: &mut [f32], c1: &mut [f32], c2: &mut [f32]) {
    debug_assert!(c0.len() == c1.len() && c1.len() == c2.len());
    for i in 0..c0.len() {
        let (y, cb, cr) = (c0[i], c1[i], c2[i]);
        c0[i] = y + cr * CR_FACT_R;
        c1[i] = y - cr * CR_FACT_G - cb * CB_FACT_G;
        c2[i] = y + cb * CB_FACT_B;
    }
}

#[inline(always)]
fn ict_forward_f32_x4(c0: &mut [f32], c1: &mut [f32], c2: &mut [f32]) {
    let (r4, rr) = c0.as_chunks_mut::<4>();
    let (g4, gr) = c1.as_chunks_mut::<4>();
    let (b4, br) = c2.as_chunks_mut::<4>();
    debug_assert!(rr.is_empty() && gr.is_empty() && br.is_empty());
    for ((rc, gc), bc) in r4.iter_mut().zip(g4.iter_mut()).zip(b4.iter_mut()) {
        let r = f32x4::from(*rc);
        let g = f32x4::from(*gc);
        let b = f32x4::from(*bc);
        let y = r * f32x4::splat(ALPHA_R) + g * f32x4::splat(ALPHA_G) + b * f32x4::splat(ALPHA_B);
        *rc = y.into();
        *gc = ((b - y) * f32x4::splat(CB_SCALE)).into();
        *bc = ((r - y) * f32x4::splat(CR_SCALE)).into();
    }
}

#[inline(always)]
fn ict_inverse_f32_x4(c0: &mut [f32], c1: &mut [f32], c2: &mut [f32]) {
    let (y4, yr) = c0.as_chunks_mut::<4>();
    let (cb4, cbr) = c1.as_chunks_mut::<4>();
    let (cr4, crr) = c2.as_chunks_mut::<4>();
    debug_assert!(yr.is_empty() && cbr.is_empty() && crr.is_empty());
    for ((yc, cbc), crc) in y4.iter_mut().zip(cb4.iter_mut()).zip(cr4.iter_mut()) {
        let y = f32x4::from(*yc);
        let cb = f32x4::from(*cbc);
        let cr = f32x4::from(*crc);
        *yc = (y + cr * f32x4::splat(CR_FACT_R)).into();
        *cbc = (y - cr * f32x4::splat(CR_FACT_G) - cb * f32x4::splat(CB_FACT_G)).into();
        *crc = (y + cb * f32x4::splat(CB_FACT_B)).into();
    }
}

#[inline(always)]
fn ict_forward_f32_x8(c0: &mut [f32], c1: &mut [f32], c2: &mut [f32]) {
    let (r8, rr) = c0.as_chunks_mut::<8>();
    let (g8, gr) = c1.as_chunks_mut::<8>();
    let (b8, br) = c2.as_chunks_mut::<8>();
    debug_assert!(rr.is_empty() && gr.is_empty() && br.is_empty());
    for ((rc, gc), bc) in r8.iter_mut().zip(g8.iter_mut()).zip(b8.iter_mut()) {
        let r = f32x8::from(*rc);
        let g = f32x8::from(*gc);
        let b = f32x8::from(*bc);
        let y = r * f32x8::splat(ALPHA_R) + g * f32x8::splat(ALPHA_G) + b * f32x8::splat(ALPHA_B);
        *rc = y.into();
        *gc = ((b - y) * f32x8::splat(CB_SCALE)).into();
        *bc = ((r - y) * f32x8::splat(CR_SCALE)).into();
    }
}

#[inline(always)]
fn ict_inverse_f32_x8(c0: &mut [f32], c1: &mut [f32], c2: &mut [f32]) {
    let (y8, yr) = c0.as_chunks_mut::<8>();
    let (cb8, cbr) = c1.as_chunks_mut::<8>();
    let (cr8, crr) = c2.as_chunks_mut::<8>();
    debug_assert!(yr.is_empty() && cbr.is_empty() && crr.is_empty());
    for ((yc, cbc), crc) in y8.iter_mut().zip(cb8.iter_mut()).zip(cr8.iter_mut()) {
        let y = f32x8::from(*yc);
        let cb = f32x8::from(*cbc);
        let cr = f32x8::from(*crc);
        *yc = (y + cr * f32x8::splat(CR_FACT_R)).into();
        *cbc = (y - cr * f32x8::splat(CR_FACT_G) - cb * f32x8::splat(CB_FACT_G)).into();
        *crc = (y + cb * f32x8::splat(CB_FACT_B)).into();
    }
}

/// Two x8 chunks per iteration; under 512-bit target features the pair
/// fuses into single full-width operations.
#[inline(always)]
fn ict_forward_f32_x16(c0: &mut [f32], c1: &mut [f32], c2: &mut [f32]) {
    debug_assert_eq!(c0.len() % 16, 0);
    ict_forward_f32_x8(c0, c1, c2);
}

#[inline(always)]
fn ict_inverse_f32_x16(c0: &mut [f32], c1: &mut [f32], c2: &mut [f32]) {
    debug_assert_eq!(c0.len() % 16, 0);
    ict_inverse_f32_x8(c0, c1, c2);
}

// ============================================================================
// Irreversible (ICT) Q15 bodies
// ============================================================================

#[inline(always)]
fn ict_forward_q15_body(c0: &mut [i16], c1: &mut [i16], c2: &mut [i16]) {
    debug_assert!(c0.len() == c1.len() && c1.len() == c2.len());
    for i in 0..c0.len() {
        let (r, g, b) = (c0[i], c1[i], c2[i]);
        let y = mulhrs(r, ALPHA_R_Q15)
            .saturating_add(mulhrs(g, ALPHA_G_Q15))
            .saturating_add(mulhrs(b, ALPHA_B_Q15));
        c0[i] = y;
        c1[i] = mulhrs(b.saturating_sub(y), CB_SCALE_Q15);
        c2[i] = mulhrs(r.saturating_sub(y), CR_SCALE_Q15);
    }
}

#[inline(always)]
fn ict_inverse_q15_body(c0: &mut [i16], c1: &mut [i16], c2: &mut [i16]) {
    debug_assert!(c0.len() == c1.len() && c1.len() == c2.len());
    for i in 0..c0.len() {
        let (y, cb, cr) = (c0[i], c1[i], c2[i]);
        let cb2 = sat_double(cb);
        let cr2 = sat_double(cr);
        c0[i] = y.saturating_add(mulhrs(cr2, CR_FACT_R_Q14));
        c1[i] = y
            .saturating_sub(mulhrs(cr2, CR_FACT_G_Q14))
            .saturating_sub(mulhrs(cb2, CB_FACT_G_Q14));
        c2[i] = y.saturating_add(mulhrs(cb2, CB_FACT_B_Q14));
    }
}

// ============================================================================
// Scalar references (dispatch-slot entry points)
// ============================================================================

/// Scalar reversible forward transform, 16-bit.
pub fn rct_forward_i16(c0: &mut [i16], c1: &mut [i16], c2: &mut [i16]) {
    rct_forward_i16_body(c0, c1, c2);
}

/// Scalar reversible inverse transform, 16-bit.
pub fn rct_inverse_i16(c0: &mut [i16], c1: &mut [i16], c2: &mut [i16]) {
    rct_inverse_i16_body(c0, c1, c2);
}

/// Scalar reversible forward transform, 32-bit.
pub fn rct_forward_i32(c0: &mut [i32], c1: &mut [i32], c2: &mut [i32]) {
    rct_forward_i32_body(c0, c1, c2);
}

/// Scalar reversible inverse transform, 32-bit.
pub fn rct_inverse_i32(c0: &mut [i32], c1: &mut [i32], c2: &mut [i32]) {
    rct_inverse_i32_body(c0, c1, c2);
}

/// Scalar irreversible forward transform, f32.
pub fn ict_forward_f32(c0: &mut [f32], c1: &mut [f32], c2: &mut [f32]) {
    ict_forward_f32_body(c0, c1, c2);
}

/// Scalar irreversible inverse transform, f32.
pub fn ict_inverse_f32(c0: &mut [f32], c1: &mut [f32], c2: &mut [f32]) {
    ict_inverse_f32_body(c0, c1, c2);
}

/// Scalar irreversible forward transform, Q15.
pub fn ict_forward_q15(c0: &mut [i16], c1: &mut [i16], c2: &mut [i16]) {
    ict_forward_q15_body(c0, c1, c2);
}

/// Scalar irreversible inverse transform, Q15.
pub fn ict_inverse_q15(c0: &mut [i16], c1: &mut [i16], c2: &mut [i16]) {
    ict_inverse_q15_body(c0, c1, c2);
}

// ============================================================================
// Tier clones
// ============================================================================

tier_clone!(x86 "ssse3,sse4.1", fn rct_forward_i16_v128(c0: &mut [i16], c1: &mut [i16], c2: &mut [i16]) = rct_forward_i16_body);
tier_clone!(x86 "avx,avx2,fma", fn rct_forward_i16_v256(c0: &mut [i16], c1: &mut [i16], c2: &mut [i16]) = rct_forward_i16_body);
tier_clone!(aarch64 fn rct_forward_i16_neon(c0: &mut [i16], c1: &mut [i16], c2: &mut [i16]) = rct_forward_i16_body);

tier_clone!(x86 "ssse3,sse4.1", fn rct_inverse_i16_v128(c0: &mut [i16], c1: &mut [i16], c2: &mut [i16]) = rct_inverse_i16_body);
tier_clone!(x86 "avx,avx2,fma", fn rct_inverse_i16_v256(c0: &mut [i16], c1: &mut [i16], c2: &mut [i16]) = rct_inverse_i16_body);
tier_clone!(aarch64 fn rct_inverse_i16_neon(c0: &mut [i16], c1: &mut [i16], c2: &mut [i16]) = rct_inverse_i16_body);

tier_clone!(x86 "avx,avx2,fma", fn rct_forward_i32_v256(c0: &mut [i32], c1: &mut [i32], c2: &mut [i32]) = rct_forward_i32_body);
tier_clone!(aarch64 fn rct_forward_i32_neon(c0: &mut [i32], c1: &mut [i32], c2: &mut [i32]) = rct_forward_i32_body);

tier_clone!(x86 "avx,avx2,fma", fn rct_inverse_i32_v256(c0: &mut [i32], c1: &mut [i32], c2: &mut [i32]) = rct_inverse_i32_body);
tier_clone!(aarch64 fn rct_inverse_i32_neon(c0: &mut [i32], c1: &mut [i32], c2: &mut [i32]) = rct_inverse_i32_body);

tier_clone!(x86 "ssse3,sse4.1", fn ict_forward_f32_v128(c0: &mut [f32], c1: &mut [f32], c2: &mut [f32]) = ict_forward_f32_x4);
tier_clone!(x86 "avx", fn ict_forward_f32_v256f(c0: &mut [f32], c1: &mut [f32], c2: &mut [f32]) = ict_forward_f32_x8);
tier_clone!(x86 "avx,avx2,fma,avx512f,avx512bw,avx512dq,avx512vl", fn ict_forward_f32_v512(c0: &mut [f32], c1: &mut [f32], c2: &mut [f32]) = ict_forward_f32_x16);
tier_clone!(aarch64 fn ict_forward_f32_neon(c0: &mut [f32], c1: &mut [f32], c2: &mut [f32]) = ict_forward_f32_x4);

tier_clone!(x86 "ssse3,sse4.1", fn ict_inverse_f32_v128(c0: &mut [f32], c1: &mut [f32], c2: &mut [f32]) = ict_inverse_f32_x4);
tier_clone!(x86 "avx", fn ict_inverse_f32_v256f(c0: &mut [f32], c1: &mut [f32], c2: &mut [f32]) = ict_inverse_f32_x8);
tier_clone!(x86 "avx,avx2,fma,avx512f,avx512bw,avx512dq,avx512vl", fn ict_inverse_f32_v512(c0: &mut [f32], c1: &mut [f32], c2: &mut [f32]) = ict_inverse_f32_x16);
tier_clone!(aarch64 fn ict_inverse_f32_neon(c0: &mut [f32], c1: &mut [f32], c2: &mut [f32]) = ict_inverse_f32_x4);

tier_clone!(x86 "ssse3,sse4.1", fn ict_forward_q15_v128(c0: &mut [i16], c1: &mut [i16], c2: &mut [i16]) = ict_forward_q15_body);
tier_clone!(x86 "avx,avx2,fma", fn ict_forward_q15_v256(c0: &mut [i16], c1: &mut [i16], c2: &mut [i16]) = ict_forward_q15_body);
tier_clone!(aarch64 fn ict_forward_q15_neon(c0: &mut [i16], c1: &mut [i16], c2: &mut [i16]) = ict_forward_q15_body);

tier_clone!(x86 "ssse3,sse4.1", fn ict_inverse_q15_v128(c0: &mut [i16], c1: &mut [i16], c2: &mut [i16]) = ict_inverse_q15_body);
tier_clone!(x86 "avx,avx2,fma", fn ict_inverse_q15_v256(c0: &mut [i16], c1: &mut [i16], c2: &mut [i16]) = ict_inverse_q15_body);
tier_clone!(aarch64 fn ict_inverse_q15_neon(c0: &mut [i16], c1: &mut [i16], c2: &mut [i16]) = ict_inverse_q15_body);

// ============================================================================
// Candidate tables
// ============================================================================

kernel_set! {
    /// Reversible RGB→YDbDr, 16-bit.
    pub static RCT_FORWARD_I16: crate::colour::Lines16Fn = {
        name: "rct_forward_i16",
        reference: rct_forward_i16,
        x86: [(V256, 16, rct_forward_i16_v256), (V128, 8, rct_forward_i16_v128)],
        aarch64: [(V128, 8, rct_forward_i16_neon)],
    };
}

kernel_set! {
    /// Reversible YDbDr→RGB, 16-bit.
    pub static RCT_INVERSE_I16: crate::colour::Lines16Fn = {
        name: "rct_inverse_i16",
        reference: rct_inverse_i16,
        x86: [(V256, 16, rct_inverse_i16_v256), (V128, 8, rct_inverse_i16_v128)],
        aarch64: [(V128, 8, rct_inverse_i16_neon)],
    };
}

kernel_set! {
    /// Reversible RGB→YDbDr, 32-bit.
    pub static RCT_FORWARD_I32: crate::colour::Lines32Fn = {
        name: "rct_forward_i32",
        reference: rct_forward_i32,
        x86: [(V256, 8, rct_forward_i32_v256)],
        aarch64: [(V128, 4, rct_forward_i32_neon)],
    };
}

kernel_set! {
    /// Reversible YDbDr→RGB, 32-bit.
    pub static RCT_INVERSE_I32: crate::colour::Lines32Fn = {
        name: "rct_inverse_i32",
        reference: rct_inverse_i32,
        x86: [(V256, 8, rct_inverse_i32_v256)],
        aarch64: [(V128, 4, rct_inverse_i32_neon)],
    };
}

kernel_set! {
    /// Irreversible RGB→YCbCr, f32.
    pub static ICT_FORWARD_F32: crate::colour::LinesF32Fn = {
        name: "ict_forward_f32",
        reference: ict_forward_f32,
        x86: [
            (V512, 16, ict_forward_f32_v512),
            (V256F, 8, ict_forward_f32_v256f),
            (V128, 4, ict_forward_f32_v128),
        ],
        aarch64: [(V128, 4, ict_forward_f32_neon)],
    };
}

kernel_set! {
    /// Irreversible YCbCr→RGB, f32.
    pub static ICT_INVERSE_F32: crate::colour::LinesF32Fn = {
        name: "ict_inverse_f32",
        reference: ict_inverse_f32,
        x86: [
            (V512, 16, ict_inverse_f32_v512),
            (V256F, 8, ict_inverse_f32_v256f),
            (V128, 4, ict_inverse_f32_v128),
        ],
        aarch64: [(V128, 4, ict_inverse_f32_neon)],
    };
}

kernel_set! {
    /// Irreversible RGB→YCbCr, Q15.
    pub static ICT_FORWARD_Q15: crate::colour::Lines16Fn = {
        name: "ict_forward_q15",
        reference: ict_forward_q15,
        x86: [(V256, 16, ict_forward_q15_v256), (V128, 8, ict_forward_q15_v128)],
        aarch64: [(V128, 8, ict_forward_q15_neon)],
    };
}

kernel_set! {
    /// Irreversible YCbCr→RGB, Q15.
    pub static ICT_INVERSE_Q15: crate::colour::Lines16Fn = {
        name: "ict_inverse_q15",
        reference: ict_inverse_q15,
        x86: [(V256, 16, ict_inverse_q15_v256), (V128, 8, ict_inverse_q15_v128)],
        aarch64: [(V128, 8, ict_inverse_q15_neon)],
    };
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rct_i16_roundtrip_example() {
        let mut c0 = vec![100i16];
        let mut c1 = vec![50i16];
        let mut c2 = vec![200i16];

        rct_forward_i16(&mut c0, &mut c1, &mut c2);
        assert_eq!((c0[0], c1[0], c2[0]), (100, 150, 50), "Y, Db, Dr");

        rct_inverse_i16(&mut c0, &mut c1, &mut c2);
        assert_eq!((c0[0], c1[0], c2[0]), (100, 50, 200));
    }

    #[test]
    fn rct_i16_roundtrip_sweep() {
        // Headroom-bounded sweep: saturation never engages, so the lifting
        // must invert exactly, negatives included.
        let vals: Vec<i16> = (-4096..4096).step_by(37).map(|v| v as i16).collect();
        for &r in &vals {
            let mut c0 = vec![r, r, -r];
            let mut c1 = vec![-r, r / 3, r];
            let mut c2 = vec![r / 2, -r, r];
            let orig = (c0.clone(), c1.clone(), c2.clone());
            rct_forward_i16(&mut c0, &mut c1, &mut c2);
            rct_inverse_i16(&mut c0, &mut c1, &mut c2);
            assert_eq!((c0, c1, c2), orig, "failed for r={}", r);
        }
    }

    #[test]
    fn rct_i32_roundtrip_full_range_samples() {
        let mut c0 = vec![1 << 20, -(1 << 20), 12345, -1];
        let mut c1 = vec![-(1 << 19), 1 << 18, -54321, 0];
        let mut c2 = vec![777, -777, 1 << 21, 1];
        let orig = (c0.clone(), c1.clone(), c2.clone());
        rct_forward_i32(&mut c0, &mut c1, &mut c2);
        rct_inverse_i32(&mut c0, &mut c1, &mut c2);
        assert_eq!((c0, c1, c2), orig);
    }

    #[test]
    fn rct_floor_shift_semantics() {
        // (2*0 + -1 + 0) >> 2 must floor to -1, not truncate to 0.
        let mut c0 = vec![-1i16];
        let mut c1 = vec![0i16];
        let mut c2 = vec![0i16];
        rct_forward_i16(&mut c0, &mut c1, &mut c2);
        assert_eq!(c0[0], -1);
    }

    #[test]
    fn ict_f32_grey_has_zero_chroma() {
        let mut c0 = vec![0.5f32; 8];
        let mut c1 = vec![0.5f32; 8];
        let mut c2 = vec![0.5f32; 8];
        ict_forward_f32(&mut c0, &mut c1, &mut c2);
        for i in 0..8 {
            assert!((c0[i] - 0.5).abs() < 1e-6, "grey luma should pass through");
            assert!(c1[i].abs() < 1e-6 && c2[i].abs() < 1e-6);
        }
    }

    #[test]
    fn ict_f32_roundtrip() {
        let mut c0: Vec<f32> = (0..64).map(|i| i as f32 / 63.0).collect();
        let mut c1: Vec<f32> = (0..64).map(|i| (63 - i) as f32 / 63.0).collect();
        let mut c2: Vec<f32> = (0..64).map(|i| (i as f32 / 63.0).powi(2)).collect();
        let orig = (c0.clone(), c1.clone(), c2.clone());
        ict_forward_f32(&mut c0, &mut c1, &mut c2);
        ict_inverse_f32(&mut c0, &mut c1, &mut c2);
        for i in 0..64 {
            assert!((c0[i] - orig.0[i]).abs() < 1e-5, "R mismatch at {}", i);
            assert!((c1[i] - orig.1[i]).abs() < 1e-5, "G mismatch at {}", i);
            assert!((c2[i] - orig.2[i]).abs() < 1e-5, "B mismatch at {}", i);
        }
    }

    #[test]
    fn ict_q15_roundtrip_bounded() {
        // Mid-range fixed-point samples; each multiply-high-round step loses
        // at most half an LSB, so the full trip stays within a few LSBs.
        let mut c0: Vec<i16> = (0..256).map(|i| (i * 23 - 3000) as i16).collect();
        let mut c1: Vec<i16> = (0..256).map(|i| (2900 - i * 21) as i16).collect();
        let mut c2: Vec<i16> = (0..256).map(|i| (i * 17 - 2100) as i16).collect();
        let orig = (c0.clone(), c1.clone(), c2.clone());
        ict_forward_q15(&mut c0, &mut c1, &mut c2);
        ict_inverse_q15(&mut c0, &mut c1, &mut c2);
        for i in 0..256 {
            assert!(
                (i32::from(c0[i]) - i32::from(orig.0[i])).abs() <= 8,
                "R drift at {}: {} -> {}",
                i,
                orig.0[i],
                c0[i]
            );
            assert!((i32::from(c1[i]) - i32::from(orig.1[i])).abs() <= 8);
            assert!((i32::from(c2[i]) - i32::from(orig.2[i])).abs() <= 8);
        }
    }

    #[test]
    fn vector_bodies_match_scalar() {
        let len = 64;
        let mk = |seed: u32| -> Vec<f32> {
            (0..len)
                .map(|i| {
                    let h = (i as u32).wrapping_mul(2_654_435_761) ^ seed;
                    (h % 1000) as f32 / 999.0
                })
                .collect()
        };
        let (r0, g0, b0) = (mk(1), mk(2), mk(3));

        let mut scalar = (r0.clone(), g0.clone(), b0.clone());
        ict_forward_f32_body(&mut scalar.0, &mut scalar.1, &mut scalar.2);

        let mut x8 = (r0.clone(), g0.clone(), b0.clone());
        ict_forward_f32_x8(&mut x8.0, &mut x8.1, &mut x8.2);

        let mut x4 = (r0, g0, b0);
        ict_forward_f32_x4(&mut x4.0, &mut x4.1, &mut x4.2);

        for i in 0..len {
            assert_eq!(scalar.0[i].to_bits(), x8.0[i].to_bits(), "x8 Y lane {}", i);
            assert_eq!(scalar.1[i].to_bits(), x8.1[i].to_bits(), "x8 Cb lane {}", i);
            assert_eq!(scalar.2[i].to_bits(), x8.2[i].to_bits(), "x8 Cr lane {}", i);
            assert_eq!(scalar.0[i].to_bits(), x4.0[i].to_bits(), "x4 Y lane {}", i);
        }
    }

    #[test]
    fn saturation_engages_at_extremes() {
        // Extremal 16-bit inputs must clip, not wrap.
        let mut c0 = vec![i16::MAX];
        let mut c1 = vec![i16::MIN];
        let mut c2 = vec![i16::MAX];
        rct_forward_i16(&mut c0, &mut c1, &mut c2);
        // Db = MAX - MIN saturates to MAX; no panic, no wraparound.
        assert_eq!(c1[0], i16::MAX);
    }
}
