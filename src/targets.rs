//! Per-tier target specification for kernel variants.
//!
//! Two macros keep the tier wiring declarative:
//!
//! - [`tier_clone!`](crate::targets) wraps a portable `#[inline(always)]`
//!   kernel body in a `#[target_feature]` clone for one capability tier,
//!   exposing it as a plain safe `fn` suitable for a dispatch slot.
//! - [`kernel_set!`](crate::targets) declares the per-operation candidate
//!   table, ordered most to least capable, with the per-architecture
//!   variants selected by `cfg`.
//!
//! Concrete instruction-set feature strings appear only at `tier_clone!`
//! call sites and in the probe; everything else speaks in terms of
//! [`CapabilityLevel`](crate::caps::CapabilityLevel) tiers.

/// Clone a portable kernel body under a `#[target_feature]` wrapper.
///
/// The generated function is a safe `fn` item whose address can be stored
/// in a dispatch slot. Its body re-enters the shared portable implementation
/// inside a feature-enabled context, so the compiler vectorizes it for that
/// tier while the numeric contract stays identical to the reference.
macro_rules! tier_clone {
    (x86 $features:literal, fn $name:ident($($arg:ident: $ty:ty),* $(,)?) = $body:path) => {
        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        pub(crate) fn $name($($arg: $ty),*) {
            #[target_feature(enable = $features)]
            unsafe fn with_features($($arg: $ty),*) {
                $body($($arg),*)
            }
            // SAFETY: this variant is only handed out by `KernelSet::resolve`
            // after the capability probe confirmed a tier that implies every
            // feature named in `$features`.
            unsafe { with_features($($arg),*) }
        }
    };
    (aarch64 fn $name:ident($($arg:ident: $ty:ty),* $(,)?) = $body:path) => {
        #[cfg(target_arch = "aarch64")]
        pub(crate) fn $name($($arg: $ty),*) {
            #[target_feature(enable = "neon")]
            unsafe fn with_features($($arg: $ty),*) {
                $body($($arg),*)
            }
            // SAFETY: NEON presence is confirmed by the probe before any
            // V128 slot can resolve to this variant.
            unsafe { with_features($($arg),*) }
        }
    };
}

/// Declare one operation's candidate table for every architecture.
///
/// Candidates are listed most-capable first; `KernelSet::resolve` walks the
/// slice in order. Architectures with no accelerated variants fall through
/// to an empty table, which resolves to the scalar reference.
macro_rules! kernel_set {
    (
        $(#[$meta:meta])*
        $vis:vis static $name:ident: $fnty:ty = {
            name: $disp:literal,
            reference: $reference:path,
            x86: [$(($lvl:ident, $quantum:expr, $func:path)),* $(,)?],
            aarch64: [$(($alvl:ident, $aquantum:expr, $afunc:path)),* $(,)?],
        };
    ) => {
        $(#[$meta])*
        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        $vis static $name: $crate::dispatch::KernelSet<$fnty> = $crate::dispatch::KernelSet {
            name: $disp,
            reference: $reference,
            candidates: &[$($crate::dispatch::Candidate {
                min_level: $crate::caps::CapabilityLevel::$lvl,
                quantum: $quantum,
                func: $func,
            }),*],
        };

        $(#[$meta])*
        #[cfg(target_arch = "aarch64")]
        $vis static $name: $crate::dispatch::KernelSet<$fnty> = $crate::dispatch::KernelSet {
            name: $disp,
            reference: $reference,
            candidates: &[$($crate::dispatch::Candidate {
                min_level: $crate::caps::CapabilityLevel::$alvl,
                quantum: $aquantum,
                func: $afunc,
            }),*],
        };

        $(#[$meta])*
        #[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
        $vis static $name: $crate::dispatch::KernelSet<$fnty> = $crate::dispatch::KernelSet {
            name: $disp,
            reference: $reference,
            candidates: &[],
        };
    };
}

pub(crate) use kernel_set;
pub(crate) use tier_clone;
