//! Architecture-adaptive sample-transform kernels for image codec pipelines.
//!
//! This crate is the numeric kernel layer of a codec: pure, re-entrant
//! per-line transforms — colour conversion, multi-component mixing,
//! sign/magnitude re-encoding, fractional-phase resampling, and
//! coefficient-to-sample transfer — behind a capability-based dispatch
//! registry that picks the fastest correct implementation for the running
//! processor. It performs no I/O, owns no buffers, and makes no policy
//! decisions; the calling pipeline supplies pre-sized lines and chooses
//! which transforms to apply.
//!
//! # Module Organization
//!
//! - [`dispatch`] - **Entry point**: the [`Kernels`](dispatch::Kernels)
//!   registry, resolved once per configuration
//! - [`caps`] - One-time processor capability probe
//! - [`colour`] - Reversible and irreversible colour transforms
//! - [`matrix`] - Multi-component linear mixing
//! - [`smag`] - Sign/magnitude re-encoding at arbitrary precision
//! - [`resample`] - Fractional-phase horizontal resampling
//! - [`transfer`] - Sign-magnitude coefficient block transfer
//! - [`rounding`] - Scoped rounding-mode control
//!
//! # Quick Start
//!
//! Resolve a slot once per configuration, then invoke it per line:
//!
//! ```rust
//! use sample_kernels::dispatch::Kernels;
//!
//! let kernels = Kernels::detect();
//!
//! let mut r = vec![100i16; 64];
//! let mut g = vec![50i16; 64];
//! let mut b = vec![200i16; 64];
//!
//! let forward = kernels.rct_forward_i16(r.len());
//! let inverse = kernels.rct_inverse_i16(r.len());
//!
//! forward(&mut r, &mut g, &mut b);
//! inverse(&mut r, &mut g, &mut b);
//! assert_eq!((r[0], g[0], b[0]), (100, 50, 200));
//! ```
//!
//! # Pinning a capability tier
//!
//! The registry is an immutable configuration object, so tests can force
//! any tier the machine supports — including the scalar references:
//!
//! ```rust
//! use sample_kernels::caps::CapabilityLevel;
//! use sample_kernels::dispatch::Kernels;
//!
//! let scalar = Kernels::with_level(CapabilityLevel::Baseline);
//! assert_eq!(scalar.level(), CapabilityLevel::Baseline);
//! ```
//!
//! # Contract
//!
//! Kernels are synchronous, lock-free, allocation-free, and safe to call
//! from any number of threads on disjoint buffers. Precondition violations
//! (mismatched lengths, out-of-range precision, stale cursors) are
//! debug-assertions, not recoverable errors; resampling table construction
//! is the one place that validates and returns
//! [`Result`](resample::TableError). Capability mismatch is never an error:
//! resolution always yields a valid implementation, degrading to the scalar
//! reference.

#![warn(missing_docs)]

// ============================================================================
// Public modules
// ============================================================================

pub mod caps;
pub mod colour;
pub mod dispatch;
pub mod matrix;
pub mod resample;
pub mod rounding;
pub mod smag;
pub mod transfer;

// ============================================================================
// Internal modules
// ============================================================================

mod fixed;
mod targets;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use crate::caps::CapabilityLevel;
    use crate::dispatch::Kernels;

    #[test]
    fn registry_roundtrip_through_resolved_slots() {
        let kernels = Kernels::detect();
        let mut r: Vec<i16> = (0..128).map(|i| (i * 17 - 900) as i16).collect();
        let mut g: Vec<i16> = (0..128).map(|i| (700 - i * 11) as i16).collect();
        let mut b: Vec<i16> = (0..128).map(|i| (i * 5 - 300) as i16).collect();
        let orig = (r.clone(), g.clone(), b.clone());

        let forward = kernels.rct_forward_i16(r.len());
        let inverse = kernels.rct_inverse_i16(r.len());
        forward(&mut r, &mut g, &mut b);
        inverse(&mut r, &mut g, &mut b);

        assert_eq!((r, g, b), orig);
    }

    #[test]
    fn every_tier_yields_usable_slots() {
        for level in [
            CapabilityLevel::Baseline,
            CapabilityLevel::V128,
            CapabilityLevel::V256F,
            CapabilityLevel::V256,
            CapabilityLevel::V512,
        ] {
            let kernels = Kernels::with_level(level);
            let mut line = vec![0.25f32; 32];
            let mut cb = vec![0.5f32; 32];
            let mut cr = vec![0.75f32; 32];
            // Invoking the slot proves it resolved to something runnable.
            kernels.ict_forward_f32(32)(&mut line, &mut cb, &mut cr);
            kernels.ict_inverse_f32(32)(&mut line, &mut cb, &mut cr);
        }
    }
}
