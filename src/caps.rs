//! Processor capability probing.
//!
//! The probe runs once per process, classifies the host into an ordered
//! [`CapabilityLevel`], and caches the answer. Every dispatch resolution
//! reads the cached level; repeated calls always return the same value.

use std::sync::OnceLock;

#[cfg(target_arch = "aarch64")]
use std::arch::is_aarch64_feature_detected;

/// Ordered classification of the host's vector instruction support.
///
/// Levels are strictly ordered: an implementation that requires some level
/// runs correctly on every level above it. The names describe register
/// width rather than vendor extensions so that the same ordering works on
/// every architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum CapabilityLevel {
    /// Portable scalar code only.
    Baseline = 0,
    /// 128-bit integer and float paths (SSSE3+SSE4.1 on x86-64, NEON on aarch64).
    V128 = 1,
    /// 256-bit float paths (AVX).
    V256F = 2,
    /// 256-bit integer and float paths with FMA (AVX2+FMA).
    V256 = 3,
    /// 512-bit paths (AVX-512 F/BW/DQ/VL).
    V512 = 4,
}

impl CapabilityLevel {
    /// Short human-readable name, used in log records.
    pub fn name(self) -> &'static str {
        match self {
            CapabilityLevel::Baseline => "baseline",
            CapabilityLevel::V128 => "v128",
            CapabilityLevel::V256F => "v256f",
            CapabilityLevel::V256 => "v256",
            CapabilityLevel::V512 => "v512",
        }
    }
}

/// Raw per-feature detection results backing the level classification.
///
/// Kept separate from [`CapabilityLevel`] so the feature-to-level mapping
/// is a pure function that tests can exercise with synthetic inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(missing_docs)] // fields mirror the identically-named ISA extensions
pub struct CpuFeatures {
    pub ssse3: bool,
    pub sse41: bool,
    pub avx: bool,
    pub avx2: bool,
    pub fma: bool,
    pub avx512f: bool,
    pub avx512bw: bool,
    pub avx512dq: bool,
    pub avx512vl: bool,
    pub neon: bool,
}

impl CpuFeatures {
    /// Query the running processor.
    pub fn detect() -> Self {
        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        {
            Self {
                ssse3: is_x86_feature_detected!("ssse3"),
                sse41: is_x86_feature_detected!("sse4.1"),
                avx: is_x86_feature_detected!("avx"),
                avx2: is_x86_feature_detected!("avx2"),
                fma: is_x86_feature_detected!("fma"),
                avx512f: is_x86_feature_detected!("avx512f"),
                avx512bw: is_x86_feature_detected!("avx512bw"),
                avx512dq: is_x86_feature_detected!("avx512dq"),
                avx512vl: is_x86_feature_detected!("avx512vl"),
                neon: false,
            }
        }

        #[cfg(target_arch = "aarch64")]
        {
            Self {
                neon: is_aarch64_feature_detected!("neon"),
                ..Self::default()
            }
        }

        #[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
        {
            Self::default()
        }
    }

    /// Map detected features onto the richest level they support.
    pub fn classify(&self) -> CapabilityLevel {
        if self.avx512f && self.avx512bw && self.avx512dq && self.avx512vl {
            return CapabilityLevel::V512;
        }
        if self.avx2 && self.fma {
            return CapabilityLevel::V256;
        }
        if self.avx {
            return CapabilityLevel::V256F;
        }
        if (self.ssse3 && self.sse41) || self.neon {
            return CapabilityLevel::V128;
        }
        CapabilityLevel::Baseline
    }
}

static LEVEL: OnceLock<CapabilityLevel> = OnceLock::new();

/// Probe the host processor once and return its capability level.
///
/// Idempotent and safe to call from any number of threads; the first call
/// performs the detection, every later call returns the cached value. The
/// level never changes for the lifetime of the process.
pub fn probe_capabilities() -> CapabilityLevel {
    *LEVEL.get_or_init(|| {
        let features = CpuFeatures::detect();
        let level = features.classify();
        log::debug!(
            "capability probe: {} ({:?})",
            level.name(),
            features
        );
        level
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_is_idempotent() {
        let first = probe_capabilities();
        for _ in 0..4 {
            assert_eq!(probe_capabilities(), first);
        }
    }

    #[test]
    fn levels_are_ordered() {
        assert!(CapabilityLevel::Baseline < CapabilityLevel::V128);
        assert!(CapabilityLevel::V128 < CapabilityLevel::V256F);
        assert!(CapabilityLevel::V256F < CapabilityLevel::V256);
        assert!(CapabilityLevel::V256 < CapabilityLevel::V512);
    }

    #[test]
    fn classify_empty_features_is_baseline() {
        assert_eq!(CpuFeatures::default().classify(), CapabilityLevel::Baseline);
    }

    #[test]
    fn classify_requires_complete_tiers() {
        // AVX-512F alone does not reach V512; the probe falls back to the
        // widest complete tier below it.
        let partial = CpuFeatures {
            avx512f: true,
            avx2: true,
            fma: true,
            avx: true,
            ssse3: true,
            sse41: true,
            ..CpuFeatures::default()
        };
        assert_eq!(partial.classify(), CapabilityLevel::V256);

        // AVX2 without FMA only qualifies for the float-only AVX tier.
        let no_fma = CpuFeatures {
            avx2: true,
            avx: true,
            ssse3: true,
            sse41: true,
            ..CpuFeatures::default()
        };
        assert_eq!(no_fma.classify(), CapabilityLevel::V256F);
    }

    #[test]
    fn classify_neon_is_v128() {
        let neon = CpuFeatures {
            neon: true,
            ..CpuFeatures::default()
        };
        assert_eq!(neon.classify(), CapabilityLevel::V128);
    }

    #[test]
    fn detected_features_classify_to_probed_level() {
        assert_eq!(CpuFeatures::detect().classify(), probe_capabilities());
    }
}
