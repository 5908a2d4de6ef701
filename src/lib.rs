#![no_std]
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

//!
//! # Security Warning
//!
//! **DO NOT USE THIS LIBRARY IN PRODUCTION.**
//!
//! This is an educational implementation for learning and experimentation.
//! It has not been audited and the exchange is unauthenticated: it must be
//! wrapped in an authenticated protocol before it protects anything.

extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

#[cfg(test)]
mod test_util;

mod error;

mod param;

mod random;

/// SHAKE128 expansion of A
pub mod xof;

/// Portable and SIMD inner loops
pub mod kernel;

/// Inverse-CDF error sampler
mod sample;

/// Packing and products mod q
pub mod matrix;

/// Hint generation and key extraction
mod reconcile;

/// Alice round 1, Bob, Alice round 2
pub mod kex;

/// Name-keyed trait objects
mod dispatch;

pub use dispatch::{KeyExchange, new_key_exchange, new_key_exchange_with_backend};
pub use error::{Error, MessageKind, Result};
pub use kernel::{Backend, Kernel};
pub use kex::{AliceSecret, FrodoKex, SessionKey};
pub use param::{LevelInfo, ParameterSet, Parameters, SecurityLevel};
pub use random::RandomSource;
pub use xof::{SeedExpander, Shake128Expander};

#[cfg(feature = "std")]
pub use rand_core::OsRng;

/// The "recommended" level: n = 752, n̄ = 8, q = 2^15, a 256-bit key
pub mod recommended {
    use super::ParameterSet;
    use hybrid_array::sizes::{U8, U32, U64};

    /// "recommended" parameter set implementation
    #[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
    pub struct RecommendedParams;

    impl ParameterSet for RecommendedParams {
        const NAME: &'static str = "recommended";
        const METHOD_NAME: &'static str = "LWE Frodo recommended";
        const CLASSICAL_SECURITY: u32 = 144;
        const QUANTUM_SECURITY: u32 = 130;

        const LOG2_Q: u32 = 15;
        const N: usize = 752;
        const NBAR: usize = 8;
        const EXTRACTED_BITS: u32 = 4;
        const KEY_BITS: usize = 256;

        const SAMPLER_BITS: u32 = 12;
        const CDF_TABLE: &'static [u16] = &[602, 1521, 1927, 2031, 2046, 2047];

        type NbarNbar = U64; // 8 * 8
        type HintBytes = U8; // ceil(64 / 8)
        type KeyBytes = U32; // 256 / 8
    }
}
