//! Coefficient-to-sample transfer.
//!
//! Moves a `width * height` block of 32-bit sign-magnitude coefficients
//! (explicit exponent `k_max`, step size `delta`) into 16- or 32-bit sample
//! rows addressed through a row-pointer table, so destination rows may be
//! ring-buffered or otherwise non-contiguous.
//!
//! Per coefficient: split sign and magnitude bits, scale the magnitude in
//! two stages — `2^-(31 - k_max)` then `delta * 2^FIX_POINT` — so both
//! factors stay in safe f32 range, restore the sign, convert to integer
//! under the nearest-even rounding guard, and saturating-narrow to the
//! destination width.
//!
//! The output is consumed immediately downstream and gains nothing from
//! cache residency, so the accelerated x86-64 variants store through
//! non-temporal writes on the 32-byte-aligned interior of each row, with a
//! store fence on exit.

use crate::fixed::sat_i16;
use crate::rounding::NearestEvenGuard;
use crate::targets::{kernel_set, tier_clone};

/// Fractional bits of the fixed-point sample representation.
pub const FIX_POINT: u32 = 13;

/// Scaling parameters of one coefficient block.
#[derive(Debug, Clone, Copy)]
pub struct TransferParams {
    /// Exponent of the most significant coefficient bit-plane, `<= 31`.
    pub k_max: u32,
    /// Quantization step size.
    pub delta: f32,
}

impl TransferParams {
    /// Two-stage scale factors: magnitude downscale and delta rescale.
    #[inline(always)]
    fn scales(&self) -> (f32, f32) {
        debug_assert!(self.k_max <= 31);
        let downscale = 2f32.powi(self.k_max as i32 - 31);
        let base = self.delta * (1u32 << FIX_POINT) as f32;
        (downscale, base)
    }
}

/// Block transfer into 16-bit rows.
pub type Transfer16Fn = fn(&[i32], usize, &mut [&mut [i16]], &TransferParams);
/// Block transfer into 32-bit rows.
pub type Transfer32Fn = fn(&[i32], usize, &mut [&mut [i32]], &TransferParams);

#[inline(always)]
fn convert(w: i32, downscale: f32, base: f32) -> f32 {
    let mag = (w & 0x7fff_ffff) as f32;
    let val = (mag * downscale) * base;
    if w < 0 {
        -val
    } else {
        val
    }
}

#[inline(always)]
fn convert_i16(w: i32, downscale: f32, base: f32) -> i16 {
    sat_i16(convert(w, downscale, base).round_ties_even() as i32)
}

#[inline(always)]
fn convert_i32(w: i32, downscale: f32, base: f32) -> i32 {
    convert(w, downscale, base).round_ties_even() as i32
}

// ============================================================================
// Bodies
// ============================================================================

#[inline(always)]
fn transfer_to_i16_body(
    src: &[i32],
    width: usize,
    rows: &mut [&mut [i16]],
    params: &TransferParams,
) {
    debug_assert_eq!(src.len(), width * rows.len());
    let _guard = NearestEvenGuard::new();
    let (downscale, base) = params.scales();
    for (r, row) in rows.iter_mut().enumerate() {
        let coeffs = &src[r * width..][..width];
        let dst = &mut row[..width];
        for (d, &w) in dst.iter_mut().zip(coeffs.iter()) {
            *d = convert_i16(w, downscale, base);
        }
    }
}

#[inline(always)]
fn transfer_to_i32_body(
    src: &[i32],
    width: usize,
    rows: &mut [&mut [i32]],
    params: &TransferParams,
) {
    debug_assert_eq!(src.len(), width * rows.len());
    let _guard = NearestEvenGuard::new();
    let (downscale, base) = params.scales();
    for (r, row) in rows.iter_mut().enumerate() {
        let coeffs = &src[r * width..][..width];
        let dst = &mut row[..width];
        for (d, &w) in dst.iter_mut().zip(coeffs.iter()) {
            *d = convert_i32(w, downscale, base);
        }
    }
}

// ============================================================================
// Non-temporal x86-64 variants
// ============================================================================

#[cfg(target_arch = "x86_64")]
mod nt {
    use core::arch::x86_64::*;

    use super::{convert_i16, convert_i32, TransferParams};
    use crate::rounding::NearestEvenGuard;

    #[target_feature(enable = "avx,avx2,fma")]
    pub(super) unsafe fn transfer_to_i16(
        src: &[i32],
        width: usize,
        rows: &mut [&mut [i16]],
        params: &TransferParams,
    ) {
        debug_assert_eq!(src.len(), width * rows.len());
        let _guard = NearestEvenGuard::new();
        let (downscale, base) = params.scales();
        for (r, row) in rows.iter_mut().enumerate() {
            let coeffs = &src[r * width..][..width];
            let dst = &mut row[..width];

            // Scalar stores until the destination reaches 32-byte alignment.
            let head = dst.as_ptr().align_offset(32).min(width);
            for (d, &w) in dst[..head].iter_mut().zip(coeffs[..head].iter()) {
                *d = convert_i16(w, downscale, base);
            }

            let mut i = head;
            while i + 16 <= width {
                let mut tmp = [0i16; 16];
                for (t, &w) in tmp.iter_mut().zip(coeffs[i..i + 16].iter()) {
                    *t = convert_i16(w, downscale, base);
                }
                // SAFETY: `dst` is valid for `width` samples, `i + 16 <=
                // width`, and the head loop left `dst[i..]` 32-byte aligned.
                let v = _mm256_loadu_si256(tmp.as_ptr() as *const __m256i);
                _mm256_stream_si256(dst.as_mut_ptr().add(i) as *mut __m256i, v);
                i += 16;
            }

            for (d, &w) in dst[i..].iter_mut().zip(coeffs[i..].iter()) {
                *d = convert_i16(w, downscale, base);
            }
        }
        // SAFETY: orders the streaming stores before any subsequent read.
        _mm_sfence();
    }

    #[target_feature(enable = "avx,avx2,fma")]
    pub(super) unsafe fn transfer_to_i32(
        src: &[i32],
        width: usize,
        rows: &mut [&mut [i32]],
        params: &TransferParams,
    ) {
        debug_assert_eq!(src.len(), width * rows.len());
        let _guard = NearestEvenGuard::new();
        let (downscale, base) = params.scales();
        for (r, row) in rows.iter_mut().enumerate() {
            let coeffs = &src[r * width..][..width];
            let dst = &mut row[..width];

            let head = dst.as_ptr().align_offset(32).min(width);
            for (d, &w) in dst[..head].iter_mut().zip(coeffs[..head].iter()) {
                *d = convert_i32(w, downscale, base);
            }

            let mut i = head;
            while i + 8 <= width {
                let mut tmp = [0i32; 8];
                for (t, &w) in tmp.iter_mut().zip(coeffs[i..i + 8].iter()) {
                    *t = convert_i32(w, downscale, base);
                }
                // SAFETY: `dst` is valid for `width` samples, `i + 8 <=
                // width`, and the head loop left `dst[i..]` 32-byte aligned.
                let v = _mm256_loadu_si256(tmp.as_ptr() as *const __m256i);
                _mm256_stream_si256(dst.as_mut_ptr().add(i) as *mut __m256i, v);
                i += 8;
            }

            for (d, &w) in dst[i..].iter_mut().zip(coeffs[i..].iter()) {
                *d = convert_i32(w, downscale, base);
            }
        }
        // SAFETY: orders the streaming stores before any subsequent read.
        _mm_sfence();
    }
}

// ============================================================================
// Scalar references
// ============================================================================

/// Scalar block transfer into 16-bit rows.
pub fn transfer_to_i16(
    src: &[i32],
    width: usize,
    rows: &mut [&mut [i16]],
    params: &TransferParams,
) {
    transfer_to_i16_body(src, width, rows, params);
}

/// Scalar block transfer into 32-bit rows.
pub fn transfer_to_i32(
    src: &[i32],
    width: usize,
    rows: &mut [&mut [i32]],
    params: &TransferParams,
) {
    transfer_to_i32_body(src, width, rows, params);
}

// ============================================================================
// Tier clones and candidate tables
// ============================================================================

#[cfg(target_arch = "x86_64")]
fn transfer_to_i16_v256(src: &[i32], width: usize, rows: &mut [&mut [i16]], params: &TransferParams) {
    // SAFETY: handed out by `KernelSet::resolve` only after the probe
    // confirmed the V256 tier.
    unsafe { nt::transfer_to_i16(src, width, rows, params) }
}

#[cfg(target_arch = "x86_64")]
fn transfer_to_i32_v256(src: &[i32], width: usize, rows: &mut [&mut [i32]], params: &TransferParams) {
    // SAFETY: handed out by `KernelSet::resolve` only after the probe
    // confirmed the V256 tier.
    unsafe { nt::transfer_to_i32(src, width, rows, params) }
}

tier_clone!(x86 "ssse3,sse4.1", fn transfer_to_i16_v128(src: &[i32], width: usize, rows: &mut [&mut [i16]], params: &TransferParams) = transfer_to_i16_body);
tier_clone!(aarch64 fn transfer_to_i16_neon(src: &[i32], width: usize, rows: &mut [&mut [i16]], params: &TransferParams) = transfer_to_i16_body);

tier_clone!(x86 "ssse3,sse4.1", fn transfer_to_i32_v128(src: &[i32], width: usize, rows: &mut [&mut [i32]], params: &TransferParams) = transfer_to_i32_body);
tier_clone!(aarch64 fn transfer_to_i32_neon(src: &[i32], width: usize, rows: &mut [&mut [i32]], params: &TransferParams) = transfer_to_i32_body);

#[cfg(target_arch = "x86")]
fn transfer_to_i16_v256(src: &[i32], width: usize, rows: &mut [&mut [i16]], params: &TransferParams) {
    transfer_to_i16_v128(src, width, rows, params);
}

#[cfg(target_arch = "x86")]
fn transfer_to_i32_v256(src: &[i32], width: usize, rows: &mut [&mut [i32]], params: &TransferParams) {
    transfer_to_i32_v128(src, width, rows, params);
}

kernel_set! {
    /// Coefficient block → 16-bit rows.
    pub static TRANSFER_TO_I16: crate::transfer::Transfer16Fn = {
        name: "transfer_to_i16",
        reference: transfer_to_i16,
        x86: [(V256, 16, transfer_to_i16_v256), (V128, 8, transfer_to_i16_v128)],
        aarch64: [(V128, 8, transfer_to_i16_neon)],
    };
}

kernel_set! {
    /// Coefficient block → 32-bit rows.
    pub static TRANSFER_TO_I32: crate::transfer::Transfer32Fn = {
        name: "transfer_to_i32",
        reference: transfer_to_i32,
        x86: [(V256, 8, transfer_to_i32_v256), (V128, 8, transfer_to_i32_v128)],
        aarch64: [(V128, 8, transfer_to_i32_neon)],
    };
}

// ============================================================================
// Tests
// ============================================================================
