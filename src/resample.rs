//! Fractional-phase horizontal resampling.
//!
//! A rational ratio `num/den` (`num < 3·den`) drives an integer phase
//! accumulator. Per output the kernel selects a precomputed tap vector by
//! quantized phase — `idx = (phase + offset) >> pshift` — and advances with
//! the two-step update
//!
//! ```text
//! pos += min_adj; phase += max_phase_adj;
//! if phase >= den { phase -= den; pos += 1; }
//! ```
//!
//! which is exactly equivalent to true rational stepping without any
//! per-sample division. Tables are built once per ratio from caller-supplied
//! coefficients (filter design happens outside this layer), immutable
//! thereafter, and shared read-only across lines.
//!
//! Two paths:
//!
//! - **Generic** ([`PhaseTable`]): kernel lengths 2–6, any supported ratio.
//! - **Grouped blend** ([`BlendTable`]): two-tap expansion kernels. Groups
//!   of [`BLEND_LANES`] outputs share one per-phase entry of per-lane tap
//!   pairs; at exactly 1:1 the two source vectors are overlapping loads
//!   displaced by one sample.
//!
//! Fixed-point variants carry Q14 taps applied to saturating pre-doubled
//! 16-bit samples through multiply-high-round products.

use thiserror::Error;
use wide::f32x8;

use crate::fixed::{mulhrs, sat_double};
use crate::targets::{kernel_set, tier_clone};

/// Output lanes per grouped-blend step.
pub const BLEND_LANES: usize = 8;

/// Construction-time validation failures for resampling tables.
///
/// Kernels themselves never report errors; malformed configuration is
/// rejected here, once, where it is cheap to detect.
#[derive(Debug, Error, PartialEq, Eq)]
#[allow(missing_docs)] // display strings carry the detail
pub enum TableError {
    #[error("kernel length {0} outside supported range 2..=6")]
    KernelLength(usize),
    #[error("ratio {num}/{den} unsupported for this path")]
    Ratio { num: u32, den: u32 },
    #[error("tap data holds {got} entries, table needs {expected}")]
    TapLength { got: usize, expected: usize },
}

/// Phase accumulator state carried by the caller across calls.
///
/// The kernels are pure: they read the cursor, process one output line, and
/// write the advanced cursor back. `phase` must stay below the table's
/// denominator; `src_pos` indexes the first sample of the current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResampleCursor {
    /// Fractional position, `0 <= phase < den`.
    pub phase: u32,
    /// Index of the first source sample of the current window.
    pub src_pos: usize,
}

#[inline]
fn entry_count(den: u32, pshift: u32, offset: u32) -> usize {
    (((u64::from(den) - 1 + u64::from(offset)) >> pshift) + 1) as usize
}

#[inline]
fn validate_quantization(den: u32, pshift: u32, offset: u32, num: u32) -> Result<(), TableError> {
    // den bounded so `phase + max_phase_adj` can never wrap u32, offset
    // bounded so the quantized index stays in table range.
    if den == 0 || den > (1 << 30) || offset > den || pshift > 31 {
        return Err(TableError::Ratio { num, den });
    }
    Ok(())
}

// ============================================================================
// Generic table (kernel lengths 2-6)
// ============================================================================

/// Per-phase scalar tap vectors for the generic resampling path.
pub struct PhaseTable<T> {
    num: u32,
    den: u32,
    kernel_len: usize,
    pshift: u32,
    offset: u32,
    taps: Vec<T>,
}

impl<T: Copy> PhaseTable<T> {
    /// Build a table from `entry_count * kernel_len` caller-designed taps,
    /// stored entry-major.
    pub fn new(
        num: u32,
        den: u32,
        kernel_len: usize,
        pshift: u32,
        offset: u32,
        taps: Vec<T>,
    ) -> Result<Self, TableError> {
        validate_quantization(den, pshift, offset, num)?;
        if !(2..=6).contains(&kernel_len) {
            return Err(TableError::KernelLength(kernel_len));
        }
        if u64::from(num) >= 3 * u64::from(den) {
            return Err(TableError::Ratio { num, den });
        }
        let expected = entry_count(den, pshift, offset) * kernel_len;
        if taps.len() != expected {
            return Err(TableError::TapLength {
                got: taps.len(),
                expected,
            });
        }
        Ok(Self {
            num,
            den,
            kernel_len,
            pshift,
            offset,
            taps,
        })
    }

    pub fn num(&self) -> u32 {
        self.num
    }

    pub fn den(&self) -> u32 {
        self.den
    }

    pub fn kernel_len(&self) -> usize {
        self.kernel_len
    }

    #[inline(always)]
    fn entry(&self, idx: usize) -> &[T] {
        &self.taps[idx * self.kernel_len..][..self.kernel_len]
    }
}

/// Generic resample over f32 lines.
pub type ResampleF32Fn = fn(&PhaseTable<f32>, &mut ResampleCursor, &[f32], &mut [f32]);
/// Generic resample over 16-bit lines with Q14 taps.
pub type ResampleQ14Fn = fn(&PhaseTable<i16>, &mut ResampleCursor, &[i16], &mut [i16]);

#[inline(always)]
fn resample_f32_body(
    table: &PhaseTable<f32>,
    cursor: &mut ResampleCursor,
    src: &[f32],
    dst: &mut [f32],
) {
    let den = table.den;
    let min_adj = (table.num / den) as usize;
    let max_phase_adj = table.num % den;
    let klen = table.kernel_len;
    let mut phase = cursor.phase;
    let mut pos = cursor.src_pos;
    debug_assert!(phase < den);

    for out in dst.iter_mut() {
        let taps = table.entry(((phase + table.offset) >> table.pshift) as usize);
        debug_assert!(pos + klen <= src.len());
        let window = &src[pos..pos + klen];
        let mut acc = 0.0f32;
        for (&t, &x) in taps.iter().zip(window.iter()) {
            acc += t * x;
        }
        *out = acc;
        pos += min_adj;
        phase += max_phase_adj;
        if phase >= den {
            phase -= den;
            pos += 1;
        }
    }

    cursor.phase = phase;
    cursor.src_pos = pos;
}

#[inline(always)]
fn resample_q14_body(
    table: &PhaseTable<i16>,
    cursor: &mut ResampleCursor,
    src: &[i16],
    dst: &mut [i16],
) {
    let den = table.den;
    let min_adj = (table.num / den) as usize;
    let max_phase_adj = table.num % den;
    let klen = table.kernel_len;
    let mut phase = cursor.phase;
    let mut pos = cursor.src_pos;
    debug_assert!(phase < den);

    for out in dst.iter_mut() {
        let taps = table.entry(((phase + table.offset) >> table.pshift) as usize);
        debug_assert!(pos + klen <= src.len());
        let window = &src[pos..pos + klen];
        let mut acc = 0i16;
        for (&t, &x) in taps.iter().zip(window.iter()) {
            acc = acc.saturating_add(mulhrs(sat_double(x), t));
        }
        *out = acc;
        pos += min_adj;
        phase += max_phase_adj;
        if phase >= den {
            phase -= den;
            pos += 1;
        }
    }

    cursor.phase = phase;
    cursor.src_pos = pos;
}

// ============================================================================
// Grouped two-tap blend table (expansion ratios)
// ============================================================================

/// Per-phase, per-lane tap pairs for the grouped blend path.
///
/// Entry `e` holds two tap rows of [`BLEND_LANES`] lanes: output lane `k`
/// of a group starting at source position `p` with lane offset `o_k`
/// computes `e[0][k] * src[p + o_k] + e[1][k] * src[p + o_k + 1]`.
pub struct BlendTable<T> {
    num: u32,
    den: u32,
    pshift: u32,
    offset: u32,
    taps: Vec<[[T; BLEND_LANES]; 2]>,
}

impl<T: Copy> BlendTable<T> {
    /// Build a table from one tap-pair entry per quantized phase.
    ///
    /// This path covers expansion only (`num <= den`).
    pub fn new(
        num: u32,
        den: u32,
        pshift: u32,
        offset: u32,
        taps: Vec<[[T; BLEND_LANES]; 2]>,
    ) -> Result<Self, TableError> {
        validate_quantization(den, pshift, offset, num)?;
        if num == 0 || num > den {
            return Err(TableError::Ratio { num, den });
        }
        let expected = entry_count(den, pshift, offset);
        if taps.len() != expected {
            return Err(TableError::TapLength {
                got: taps.len(),
                expected,
            });
        }
        Ok(Self {
            num,
            den,
            pshift,
            offset,
            taps,
        })
    }

    pub fn num(&self) -> u32 {
        self.num
    }

    pub fn den(&self) -> u32 {
        self.den
    }

    #[inline(always)]
    fn entry(&self, phase: u32) -> &[[T; BLEND_LANES]; 2] {
        &self.taps[((phase + self.offset) >> self.pshift) as usize]
    }
}

/// Grouped blend over f32 lines.
pub type BlendF32Fn = fn(&BlendTable<f32>, &mut ResampleCursor, &[f32], &mut [f32]);
/// Grouped blend over 16-bit lines with Q14 taps.
pub type BlendQ14Fn = fn(&BlendTable<i16>, &mut ResampleCursor, &[i16], &mut [i16]);

#[inline(always)]
fn blend2_f32_body(
    table: &BlendTable<f32>,
    cursor: &mut ResampleCursor,
    src: &[f32],
    dst: &mut [f32],
) {
    let (num, den) = (table.num, table.den);
    let group_num = BLEND_LANES as u64 * u64::from(num);
    let group_min_adj = (group_num / u64::from(den)) as usize;
    let group_phase_adj = (group_num % u64::from(den)) as u32;
    let mut phase = cursor.phase;
    let mut pos = cursor.src_pos;
    debug_assert!(phase < den);

    let (groups, tail) = dst.as_chunks_mut::<BLEND_LANES>();
    for out in groups.iter_mut() {
        let e = table.entry(phase);
        if num == den {
            // 1:1 displacement: both tap sources come from one overlapping
            // pair of loads.
            debug_assert!(pos + BLEND_LANES + 1 <= src.len());
            let v0: &[f32; 8] = src[pos..pos + 8].try_into().unwrap();
            let v1: &[f32; 8] = src[pos + 1..pos + 9].try_into().unwrap();
            for k in 0..BLEND_LANES {
                out[k] = e[0][k] * v0[k] + e[1][k] * v1[k];
            }
        } else {
            let mut ph = phase;
            let mut off = 0usize;
            for k in 0..BLEND_LANES {
                debug_assert!(pos + off + 1 < src.len());
                out[k] = e[0][k] * src[pos + off] + e[1][k] * src[pos + off + 1];
                ph += num;
                if ph >= den {
                    ph -= den;
                    off += 1;
                }
            }
        }
        pos += group_min_adj;
        phase += group_phase_adj;
        if phase >= den {
            phase -= den;
            pos += 1;
        }
    }

    // Partial trailing group: exact per-lane stepping. Only the scalar
    // reference reaches this; accelerated variants resolve with quantum 8.
    if !tail.is_empty() {
        let e = table.entry(phase);
        let mut off = 0usize;
        for (k, out) in tail.iter_mut().enumerate() {
            *out = e[0][k] * src[pos + off] + e[1][k] * src[pos + off + 1];
            phase += num;
            if phase >= den {
                phase -= den;
                off += 1;
            }
        }
        pos += off;
    }

    cursor.phase = phase;
    cursor.src_pos = pos;
}

#[inline(always)]
fn blend2_f32_x8(
    table: &BlendTable<f32>,
    cursor: &mut ResampleCursor,
    src: &[f32],
    dst: &mut [f32],
) {
    debug_assert_eq!(dst.len() % BLEND_LANES, 0);
    let (num, den) = (table.num, table.den);
    if num != den {
        // Per-lane gathers; the shared body already expresses them.
        blend2_f32_body(table, cursor, src, dst);
        return;
    }

    // At 1:1 the phase never moves; only the source position advances.
    let phase = cursor.phase;
    let mut pos = cursor.src_pos;
    let (groups, _) = dst.as_chunks_mut::<BLEND_LANES>();
    for out in groups.iter_mut() {
        let e = table.entry(phase);
        debug_assert!(pos + BLEND_LANES + 1 <= src.len());
        let v0: &[f32; 8] = src[pos..pos + 8].try_into().unwrap();
        let v1: &[f32; 8] = src[pos + 1..pos + 9].try_into().unwrap();
        let blended =
            f32x8::from(e[0]) * f32x8::from(*v0) + f32x8::from(e[1]) * f32x8::from(*v1);
        *out = blended.into();
        pos += BLEND_LANES;
    }

    cursor.src_pos = pos;
}

#[inline(always)]
fn blend2_q14_body(
    table: &BlendTable<i16>,
    cursor: &mut ResampleCursor,
    src: &[i16],
    dst: &mut [i16],
) {
    let (num, den) = (table.num, table.den);
    let group_num = BLEND_LANES as u64 * u64::from(num);
    let group_min_adj = (group_num / u64::from(den)) as usize;
    let group_phase_adj = (group_num % u64::from(den)) as u32;
    let mut phase = cursor.phase;
    let mut pos = cursor.src_pos;
    debug_assert!(phase < den);

    let (groups, tail) = dst.as_chunks_mut::<BLEND_LANES>();
    for out in groups.iter_mut() {
        let e = table.entry(phase);
        let mut ph = phase;
        let mut off = 0usize;
        for k in 0..BLEND_LANES {
            debug_assert!(pos + off + 1 < src.len());
            let a = mulhrs(sat_double(src[pos + off]), e[0][k]);
            let b = mulhrs(sat_double(src[pos + off + 1]), e[1][k]);
            out[k] = a.saturating_add(b);
            ph += num;
            if ph >= den {
                ph -= den;
                off += 1;
            }
        }
        pos += group_min_adj;
        phase += group_phase_adj;
        if phase >= den {
            phase -= den;
            pos += 1;
        }
    }

    if !tail.is_empty() {
        let e = table.entry(phase);
        let mut off = 0usize;
        for (k, out) in tail.iter_mut().enumerate() {
            let a = mulhrs(sat_double(src[pos + off]), e[0][k]);
            let b = mulhrs(sat_double(src[pos + off + 1]), e[1][k]);
            *out = a.saturating_add(b);
            phase += num;
            if phase >= den {
                phase -= den;
                off += 1;
            }
        }
        pos += off;
    }

    cursor.phase = phase;
    cursor.src_pos = pos;
}

// ============================================================================
// Scalar references
// ============================================================================

/// Scalar generic resample, f32.
pub fn resample_f32(
    table: &PhaseTable<f32>,
    cursor: &mut ResampleCursor,
    src: &[f32],
    dst: &mut [f32],
) {
    resample_f32_body(table, cursor, src, dst);
}

/// Scalar generic resample, Q14 fixed point.
pub fn resample_q14(
    table: &PhaseTable<i16>,
    cursor: &mut ResampleCursor,
    src: &[i16],
    dst: &mut [i16],
) {
    resample_q14_body(table, cursor, src, dst);
}

/// Scalar grouped blend, f32.
pub fn blend2_f32(
    table: &BlendTable<f32>,
    cursor: &mut ResampleCursor,
    src: &[f32],
    dst: &mut [f32],
) {
    blend2_f32_body(table, cursor, src, dst);
}

/// Scalar grouped blend, Q14 fixed point.
pub fn blend2_q14(
    table: &BlendTable<i16>,
    cursor: &mut ResampleCursor,
    src: &[i16],
    dst: &mut [i16],
) {
    blend2_q14_body(table, cursor, src, dst);
}

// ============================================================================
// Tier clones and candidate tables
// ============================================================================

tier_clone!(x86 "ssse3,sse4.1", fn resample_f32_v128(table: &PhaseTable<f32>, cursor: &mut ResampleCursor, src: &[f32], dst: &mut [f32]) = resample_f32_body);
tier_clone!(x86 "avx,avx2,fma", fn resample_f32_v256(table: &PhaseTable<f32>, cursor: &mut ResampleCursor, src: &[f32], dst: &mut [f32]) = resample_f32_body);
tier_clone!(aarch64 fn resample_f32_neon(table: &PhaseTable<f32>, cursor: &mut ResampleCursor, src: &[f32], dst: &mut [f32]) = resample_f32_body);

tier_clone!(x86 "ssse3,sse4.1", fn resample_q14_v128(table: &PhaseTable<i16>, cursor: &mut ResampleCursor, src: &[i16], dst: &mut [i16]) = resample_q14_body);
tier_clone!(x86 "avx,avx2,fma", fn resample_q14_v256(table: &PhaseTable<i16>, cursor: &mut ResampleCursor, src: &[i16], dst: &mut [i16]) = resample_q14_body);
tier_clone!(aarch64 fn resample_q14_neon(table: &PhaseTable<i16>, cursor: &mut ResampleCursor, src: &[i16], dst: &mut [i16]) = resample_q14_body);

tier_clone!(x86 "ssse3,sse4.1", fn blend2_f32_v128(table: &BlendTable<f32>, cursor: &mut ResampleCursor, src: &[f32], dst: &mut [f32]) = blend2_f32_body);
tier_clone!(x86 "avx,avx2,fma", fn blend2_f32_v256(table: &BlendTable<f32>, cursor: &mut ResampleCursor, src: &[f32], dst: &mut [f32]) = blend2_f32_x8);
tier_clone!(aarch64 fn blend2_f32_neon(table: &BlendTable<f32>, cursor: &mut ResampleCursor, src: &[f32], dst: &mut [f32]) = blend2_f32_x8);

tier_clone!(x86 "ssse3,sse4.1", fn blend2_q14_v128(table: &BlendTable<i16>, cursor: &mut ResampleCursor, src: &[i16], dst: &mut [i16]) = blend2_q14_body);
tier_clone!(x86 "avx,avx2,fma", fn blend2_q14_v256(table: &BlendTable<i16>, cursor: &mut ResampleCursor, src: &[i16], dst: &mut [i16]) = blend2_q14_body);
tier_clone!(aarch64 fn blend2_q14_neon(table: &BlendTable<i16>, cursor: &mut ResampleCursor, src: &[i16], dst: &mut [i16]) = blend2_q14_body);

kernel_set! {
    /// Generic fractional-phase resample, f32.
    pub static RESAMPLE_F32: crate::resample::ResampleF32Fn = {
        name: "resample_f32",
        reference: resample_f32,
        x86: [(V256, 1, resample_f32_v256), (V128, 1, resample_f32_v128)],
        aarch64: [(V128, 1, resample_f32_neon)],
    };
}

kernel_set! {
    /// Generic fractional-phase resample, Q14.
    pub static RESAMPLE_Q14: crate::resample::ResampleQ14Fn = {
        name: "resample_q14",
        reference: resample_q14,
        x86: [(V256, 1, resample_q14_v256), (V128, 1, resample_q14_v128)],
        aarch64: [(V128, 1, resample_q14_neon)],
    };
}

kernel_set! {
    /// Grouped two-tap blend, f32.
    pub static BLEND2_F32: crate::resample::BlendF32Fn = {
        name: "blend2_f32",
        reference: blend2_f32,
        x86: [(V256, 8, blend2_f32_v256), (V128, 8, blend2_f32_v128)],
        aarch64: [(V128, 8, blend2_f32_neon)],
    };
}

kernel_set! {
    /// Grouped two-tap blend, Q14.
    pub static BLEND2_Q14: crate::resample::BlendQ14Fn = {
        name: "blend2_q14",
        reference: blend2_q14,
        x86: [(V256, 8, blend2_q14_v256), (V128, 8, blend2_q14_v128)],
        aarch64: [(V128, 8, blend2_q14_neon)],
    };
}

// ============================================================================
// Tests
// ============================================================================
