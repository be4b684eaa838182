//! Multi-component linear mixing.
//!
//! Computes one output line `out = offset + Σ_n coeff[n] * input[n]` over
//! an arbitrary number of input components. Callers produce M outputs by
//! invoking the kernel once per output channel, reusing the same
//! accumulator scratch. Two sparsity short-circuits apply — an absent
//! input (`None`) and an exactly-zero coefficient both skip the component
//! entirely; this is an identity, not an approximation.
//!
//! The fixed-point path accumulates 16-bit products in a caller-supplied
//! 32-bit scratch buffer (explicitly zeroed here, every call), then narrows
//! with a rounding-biased shifted offset and saturation.

use wide::f32x8;

use crate::fixed::sat_i16;
use crate::targets::{kernel_set, tier_clone};

/// One f32 output line from N optional input lines.
pub type MatrixF32Fn = fn(&[Option<&[f32]>], &[f32], f32, &mut [f32]);

/// One 16-bit fixed-point output line: inputs, coefficients, offset,
/// downshift, 32-bit accumulator scratch, output.
pub type MatrixQ16Fn = fn(&[Option<&[i16]>], &[i16], i16, u32, &mut [i32], &mut [i16]);

// ============================================================================
// Bodies
// ============================================================================

#[inline(always)]
fn matrix_line_f32_body(
    inputs: &[Option<&[f32]>],
    coeffs: &[f32],
    offset: f32,
    out: &mut [f32],
) {
    debug_assert_eq!(inputs.len(), coeffs.len());
    out.fill(offset);
    for (input, &c) in inputs.iter().zip(coeffs) {
        let Some(line) = input else { continue };
        if c == 0.0 {
            continue;
        }
        debug_assert_eq!(line.len(), out.len());
        for (o, &x) in out.iter_mut().zip(line.iter()) {
            *o += x * c;
        }
    }
}

#[inline(always)]
fn matrix_line_f32_x8(
    inputs: &[Option<&[f32]>],
    coeffs: &[f32],
    offset: f32,
    out: &mut [f32],
) {
    debug_assert_eq!(inputs.len(), coeffs.len());
    out.fill(offset);
    let (out8, out_rest) = out.as_chunks_mut::<8>();
    debug_assert!(out_rest.is_empty());
    for (input, &c) in inputs.iter().zip(coeffs) {
        let Some(line) = input else { continue };
        if c == 0.0 {
            continue;
        }
        let (in8, in_rest) = line.as_chunks::<8>();
        debug_assert!(in_rest.is_empty() && in8.len() == out8.len());
        let cv = f32x8::splat(c);
        for (o, x) in out8.iter_mut().zip(in8.iter()) {
            let acc = f32x8::from(*o) + f32x8::from(*x) * cv;
            *o = acc.into();
        }
    }
}

#[inline(always)]
fn matrix_line_q16_body(
    inputs: &[Option<&[i16]>],
    coeffs: &[i16],
    offset: i16,
    downshift: u32,
    acc: &mut [i32],
    out: &mut [i16],
) {
    debug_assert_eq!(inputs.len(), coeffs.len());
    debug_assert!(acc.len() >= out.len());
    debug_assert!(downshift < 32);

    let acc = &mut acc[..out.len()];
    acc.fill(0);

    for (input, &c) in inputs.iter().zip(coeffs) {
        let Some(line) = input else { continue };
        if c == 0 {
            continue;
        }
        debug_assert_eq!(line.len(), out.len());
        let c = i32::from(c);
        for (a, &x) in acc.iter_mut().zip(line.iter()) {
            *a += i32::from(x) * c;
        }
    }

    // Rounding-biased, left-shifted offset folded into the final shift.
    let round = if downshift > 0 { 1 << (downshift - 1) } else { 0 };
    let bias = (i32::from(offset) << downshift) + round;
    for (o, &a) in out.iter_mut().zip(acc.iter()) {
        *o = sat_i16((a + bias) >> downshift);
    }
}

// ============================================================================
// Scalar references
// ============================================================================

/// Scalar f32 matrix line.
pub fn matrix_line_f32(inputs: &[Option<&[f32]>], coeffs: &[f32], offset: f32, out: &mut [f32]) {
    matrix_line_f32_body(inputs, coeffs, offset, out);
}

/// Scalar 16-bit fixed-point matrix line.
pub fn matrix_line_q16(
    inputs: &[Option<&[i16]>],
    coeffs: &[i16],
    offset: i16,
    downshift: u32,
    acc: &mut [i32],
    out: &mut [i16],
) {
    matrix_line_q16_body(inputs, coeffs, offset, downshift, acc, out);
}

// ============================================================================
// Tier clones and candidate tables
// ============================================================================

tier_clone!(x86 "avx", fn matrix_line_f32_v256f(inputs: &[Option<&[f32]>], coeffs: &[f32], offset: f32, out: &mut [f32]) = matrix_line_f32_x8);
tier_clone!(aarch64 fn matrix_line_f32_neon(inputs: &[Option<&[f32]>], coeffs: &[f32], offset: f32, out: &mut [f32]) = matrix_line_f32_body);

tier_clone!(x86 "ssse3,sse4.1", fn matrix_line_q16_v128(inputs: &[Option<&[i16]>], coeffs: &[i16], offset: i16, downshift: u32, acc: &mut [i32], out: &mut [i16]) = matrix_line_q16_body);
tier_clone!(x86 "avx,avx2,fma", fn matrix_line_q16_v256(inputs: &[Option<&[i16]>], coeffs: &[i16], offset: i16, downshift: u32, acc: &mut [i32], out: &mut [i16]) = matrix_line_q16_body);
tier_clone!(aarch64 fn matrix_line_q16_neon(inputs: &[Option<&[i16]>], coeffs: &[i16], offset: i16, downshift: u32, acc: &mut [i32], out: &mut [i16]) = matrix_line_q16_body);

kernel_set! {
    /// f32 multi-component matrix line.
    pub static MATRIX_LINE_F32: crate::matrix::MatrixF32Fn = {
        name: "matrix_line_f32",
        reference: matrix_line_f32,
        x86: [(V256F, 8, matrix_line_f32_v256f)],
        aarch64: [(V128, 4, matrix_line_f32_neon)],
    };
}

kernel_set! {
    /// 16-bit fixed-point multi-component matrix line.
    pub static MATRIX_LINE_Q16: crate::matrix::MatrixQ16Fn = {
        name: "matrix_line_q16",
        reference: matrix_line_q16,
        x86: [(V256, 16, matrix_line_q16_v256), (V128, 8, matrix_line_q16_v128)],
        aarch64: [(V128, 8, matrix_line_q16_neon)],
    };
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_coefficients_yield_offset_fill() {
        let a = vec![1.0f32; 32];
        let b = vec![-2.0f32; 32];
        let inputs = [Some(a.as_slice()), Some(b.as_slice())];
        let mut out = vec![0.0f32; 32];
        matrix_line_f32(&inputs, &[0.0, 0.0], 7.5, &mut out);
        assert!(out.iter().all(|&v| v == 7.5), "all-zero coeffs must fill offset");
    }

    #[test]
    fn zero_coefficients_yield_offset_fill_q16() {
        let a = vec![123i16; 24];
        let inputs = [Some(a.as_slice())];
        let mut acc = vec![99i32; 24];
        let mut out = vec![0i16; 24];
        matrix_line_q16(&inputs, &[0], 11, 4, &mut acc, &mut out);
        assert!(out.iter().all(|&v| v == 11));
    }

    #[test]
    fn absent_inputs_are_skipped() {
        let a = vec![10.0f32; 16];
        let inputs = [Some(a.as_slice()), None, Some(a.as_slice())];
        let mut out = vec![0.0f32; 16];
        matrix_line_f32(&inputs, &[1.0, 100.0, 2.0], 0.0, &mut out);
        // The None input contributes nothing despite its large coefficient.
        assert!(out.iter().all(|&v| v == 30.0));
    }

    #[test]
    fn f32_weighted_sum() {
        let a: Vec<f32> = (0..16).map(|i| i as f32).collect();
        let b: Vec<f32> = (0..16).map(|i| (i * i) as f32).collect();
        let inputs = [Some(a.as_slice()), Some(b.as_slice())];
        let mut out = vec![0.0f32; 16];
        matrix_line_f32(&inputs, &[2.0, -1.0], 3.0, &mut out);
        for i in 0..16 {
            let expected = 3.0 + 2.0 * i as f32 - (i * i) as f32;
            assert_eq!(out[i], expected, "lane {}", i);
        }
    }

    #[test]
    fn q16_rounding_and_downshift() {
        let a = vec![100i16; 8];
        let inputs = [Some(a.as_slice())];
        let mut acc = vec![0i32; 8];
        let mut out = vec![0i16; 8];
        // acc = 100 * 3 = 300; (300 + (5<<2) + 2) >> 2 = (300 + 22) >> 2 = 80.
        matrix_line_q16(&inputs, &[3], 5, 2, &mut acc, &mut out);
        assert!(out.iter().all(|&v| v == 80), "got {:?}", out);
    }

    #[test]
    fn q16_saturates_on_narrow() {
        let a = vec![i16::MAX; 8];
        let inputs = [Some(a.as_slice())];
        let mut acc = vec![0i32; 8];
        let mut out = vec![0i16; 8];
        matrix_line_q16(&inputs, &[1000], 0, 0, &mut acc, &mut out);
        assert!(out.iter().all(|&v| v == i16::MAX));
    }

    #[test]
    fn accumulator_is_rezeroed_each_call() {
        let a = vec![1i16; 8];
        let inputs = [Some(a.as_slice())];
        let mut acc = vec![0i32; 8];
        let mut out = vec![0i16; 8];
        matrix_line_q16(&inputs, &[10], 0, 0, &mut acc, &mut out);
        matrix_line_q16(&inputs, &[10], 0, 0, &mut acc, &mut out);
        // A second call over the same scratch must not double-accumulate.
        assert!(out.iter().all(|&v| v == 10));
    }

    #[test]
    fn x8_matches_scalar_exactly() {
        let a: Vec<f32> = (0..64).map(|i| (i as f32).sin()).collect();
        let b: Vec<f32> = (0..64).map(|i| (i as f32).cos()).collect();
        let inputs = [Some(a.as_slice()), Some(b.as_slice())];
        let coeffs = [0.75f32, -1.25];

        let mut scalar_out = vec![0.0f32; 64];
        matrix_line_f32_body(&inputs, &coeffs, 0.5, &mut scalar_out);
        let mut wide_out = vec![0.0f32; 64];
        matrix_line_f32_x8(&inputs, &coeffs, 0.5, &mut wide_out);

        for i in 0..64 {
            assert_eq!(
                scalar_out[i].to_bits(),
                wide_out[i].to_bits(),
                "lane {}",
                i
            );
        }
    }
}
