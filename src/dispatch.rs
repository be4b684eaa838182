//! Kernel variant registry and resolution.
//!
//! Every primitive operation owns a [`KernelSet`]: one scalar reference
//! implementation plus a declarative, ordered table of accelerated
//! candidates. [`KernelSet::resolve`] scans the table most-capable-first and
//! returns the first variant whose tier and length-granularity preconditions
//! hold, falling back to the reference — resolution never fails and never
//! yields an unusable slot.
//!
//! Consumers go through [`Kernels`], an immutable configuration object
//! constructed once (per process via [`global`], or explicitly pinned via
//! [`Kernels::with_level`] for tests). Pipelines resolve each operation once
//! per configuration and then invoke the returned `fn` per line.

use std::sync::OnceLock;

use crate::caps::{probe_capabilities, CapabilityLevel};
use crate::{colour, matrix, resample, smag, transfer};

/// One accelerated implementation of an operation.
pub struct Candidate<F: Copy + 'static> {
    /// Lowest capability level at which this variant may run.
    pub min_level: CapabilityLevel,
    /// Required line-length granularity: the variant is only eligible when
    /// the configured length is a whole multiple of this.
    pub quantum: usize,
    /// The variant itself.
    pub func: F,
}

/// A scalar reference plus its ordered accelerated candidates.
pub struct KernelSet<F: Copy + 'static> {
    /// Operation identity, used in trace records.
    pub name: &'static str,
    /// Always-valid fallback; no preconditions beyond basic buffer validity.
    pub reference: F,
    /// Most-capable first.
    pub candidates: &'static [Candidate<F>],
}

impl<F: Copy + 'static> KernelSet<F> {
    /// Pick the best variant usable at `level` for lines of `len` elements.
    pub fn resolve(&self, level: CapabilityLevel, len: usize) -> F {
        for candidate in self.candidates {
            if candidate.min_level <= level && len % candidate.quantum == 0 {
                log::trace!(
                    "{}: resolved {} variant (quantum {})",
                    self.name,
                    candidate.min_level.name(),
                    candidate.quantum
                );
                return candidate.func;
            }
        }
        log::trace!("{}: resolved scalar reference", self.name);
        self.reference
    }
}

/// Immutable kernel configuration for one capability level.
///
/// Construct once, share freely: the object is `Copy` and every method is a
/// pure lookup. Pipelines typically call [`global`] once at startup, resolve
/// the slots their configuration needs, and invoke the resolved functions
/// per line without touching the registry again.
#[derive(Debug, Clone, Copy)]
pub struct Kernels {
    level: CapabilityLevel,
}

impl Kernels {
    /// Configuration for the probed capabilities of the running processor.
    pub fn detect() -> Self {
        Self {
            level: probe_capabilities(),
        }
    }

    /// Configuration pinned to `level`, clamped to the probed level.
    ///
    /// The clamp means a pinned configuration can never hand out a variant
    /// the machine cannot execute; pinning `Baseline` always forces the
    /// scalar references, which is the intended test hook.
    pub fn with_level(level: CapabilityLevel) -> Self {
        Self {
            level: level.min(probe_capabilities()),
        }
    }

    /// The level this configuration resolves against.
    pub fn level(&self) -> CapabilityLevel {
        self.level
    }

    // ------------------------------------------------------------------
    // Colour conversion
    // ------------------------------------------------------------------

    /// Reversible RGB→YDbDr, 16-bit, for lines of `len` samples.
    pub fn rct_forward_i16(&self, len: usize) -> colour::Lines16Fn {
        colour::RCT_FORWARD_I16.resolve(self.level, len)
    }

    /// Reversible YDbDr→RGB, 16-bit.
    pub fn rct_inverse_i16(&self, len: usize) -> colour::Lines16Fn {
        colour::RCT_INVERSE_I16.resolve(self.level, len)
    }

    /// Reversible RGB→YDbDr, 32-bit.
    pub fn rct_forward_i32(&self, len: usize) -> colour::Lines32Fn {
        colour::RCT_FORWARD_I32.resolve(self.level, len)
    }

    /// Reversible YDbDr→RGB, 32-bit.
    pub fn rct_inverse_i32(&self, len: usize) -> colour::Lines32Fn {
        colour::RCT_INVERSE_I32.resolve(self.level, len)
    }

    /// Irreversible RGB→YCbCr, f32.
    pub fn ict_forward_f32(&self, len: usize) -> colour::LinesF32Fn {
        colour::ICT_FORWARD_F32.resolve(self.level, len)
    }

    /// Irreversible YCbCr→RGB, f32.
    pub fn ict_inverse_f32(&self, len: usize) -> colour::LinesF32Fn {
        colour::ICT_INVERSE_F32.resolve(self.level, len)
    }

    /// Irreversible RGB→YCbCr, Q15 fixed point.
    pub fn ict_forward_q15(&self, len: usize) -> colour::Lines16Fn {
        colour::ICT_FORWARD_Q15.resolve(self.level, len)
    }

    /// Irreversible YCbCr→RGB, Q15 fixed point.
    pub fn ict_inverse_q15(&self, len: usize) -> colour::Lines16Fn {
        colour::ICT_INVERSE_Q15.resolve(self.level, len)
    }

    // ------------------------------------------------------------------
    // Multi-component matrix
    // ------------------------------------------------------------------

    /// One output line of the f32 multi-component matrix.
    pub fn matrix_line_f32(&self, len: usize) -> matrix::MatrixF32Fn {
        matrix::MATRIX_LINE_F32.resolve(self.level, len)
    }

    /// One output line of the 16-bit fixed-point multi-component matrix.
    pub fn matrix_line_q16(&self, len: usize) -> matrix::MatrixQ16Fn {
        matrix::MATRIX_LINE_Q16.resolve(self.level, len)
    }

    // ------------------------------------------------------------------
    // Magnitude/sign re-encoding
    // ------------------------------------------------------------------

    /// Float words → sign-magnitude integers at a given precision.
    pub fn smag_from_float(&self, len: usize) -> smag::MagFn {
        smag::SMAG_FROM_FLOAT.resolve(self.level, len)
    }

    /// Sign-magnitude integers → float words.
    pub fn smag_to_float(&self, len: usize) -> smag::MagFn {
        smag::SMAG_TO_FLOAT.resolve(self.level, len)
    }

    /// Signed-range re-clamp of plain integer words.
    pub fn smag_reclamp(&self, len: usize) -> smag::MagFn {
        smag::SMAG_RECLAMP.resolve(self.level, len)
    }

    /// Float words → unsigned integers at a given precision.
    pub fn umag_from_float(&self, len: usize) -> smag::MagFn {
        smag::UMAG_FROM_FLOAT.resolve(self.level, len)
    }

    /// Unsigned integers → float words.
    pub fn umag_to_float(&self, len: usize) -> smag::MagFn {
        smag::UMAG_TO_FLOAT.resolve(self.level, len)
    }

    /// Unsigned-range re-clamp of integer words.
    pub fn umag_reclamp(&self, len: usize) -> smag::MagFn {
        smag::UMAG_RECLAMP.resolve(self.level, len)
    }

    // ------------------------------------------------------------------
    // Resampling
    // ------------------------------------------------------------------

    /// Generic fractional-phase resample, f32 taps. `len` is the output
    /// line length.
    pub fn resample_f32(&self, len: usize) -> resample::ResampleF32Fn {
        resample::RESAMPLE_F32.resolve(self.level, len)
    }

    /// Generic fractional-phase resample, Q14 fixed-point taps.
    pub fn resample_q14(&self, len: usize) -> resample::ResampleQ14Fn {
        resample::RESAMPLE_Q14.resolve(self.level, len)
    }

    /// Grouped two-tap blend resample (expansion ratios), f32 taps.
    pub fn blend2_f32(&self, len: usize) -> resample::BlendF32Fn {
        resample::BLEND2_F32.resolve(self.level, len)
    }

    /// Grouped two-tap blend resample (expansion ratios), Q14 taps.
    pub fn blend2_q14(&self, len: usize) -> resample::BlendQ14Fn {
        resample::BLEND2_Q14.resolve(self.level, len)
    }

    // ------------------------------------------------------------------
    // Coefficient transfer
    // ------------------------------------------------------------------

    /// Sign-magnitude coefficient block → 16-bit sample rows. `width` is
    /// the per-row sample count.
    pub fn transfer_to_i16(&self, width: usize) -> transfer::Transfer16Fn {
        transfer::TRANSFER_TO_I16.resolve(self.level, width)
    }

    /// Sign-magnitude coefficient block → 32-bit sample rows.
    pub fn transfer_to_i32(&self, width: usize) -> transfer::Transfer32Fn {
        transfer::TRANSFER_TO_I32.resolve(self.level, width)
    }
}

static GLOBAL: OnceLock<Kernels> = OnceLock::new();

/// Process-wide configuration for the probed capability level.
pub fn global() -> &'static Kernels {
    GLOBAL.get_or_init(Kernels::detect)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_pin_forces_scalar_reference() {
        let kernels = Kernels::with_level(CapabilityLevel::Baseline);
        assert_eq!(kernels.level(), CapabilityLevel::Baseline);
        // Function-pointer identity: a Baseline configuration must resolve
        // the reference for every length, including accelerated-friendly ones.
        assert!(std::ptr::fn_addr_eq(
            kernels.rct_forward_i16(1024),
            colour::RCT_FORWARD_I16.reference,
        ));
    }

    #[test]
    fn pin_clamps_to_probed_level() {
        let pinned = Kernels::with_level(CapabilityLevel::V512);
        assert!(pinned.level() <= crate::caps::probe_capabilities());
    }

    #[test]
    fn odd_lengths_fall_back_to_reference() {
        let kernels = Kernels::detect();
        // No accelerated variant has quantum 1, so a prime length resolves
        // to the reference at every level.
        assert!(std::ptr::fn_addr_eq(
            kernels.ict_forward_f32(1021),
            colour::ICT_FORWARD_F32.reference,
        ));
    }

    #[test]
    fn resolution_is_deterministic() {
        let kernels = Kernels::detect();
        for _ in 0..4 {
            assert!(std::ptr::fn_addr_eq(
                kernels.matrix_line_f32(256),
                kernels.matrix_line_f32(256),
            ));
        }
    }

    #[test]
    fn global_matches_detect() {
        assert_eq!(global().level(), Kernels::detect().level());
    }
}
