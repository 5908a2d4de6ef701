//! Runtime selection of level and kernel.
//!
//! [`new_key_exchange`] resolves a level name and the process's best kernel
//! to a concrete [`FrodoKex`] once, and hands it back behind the
//! [`KeyExchange`] trait. Nothing is re-dispatched per call beyond the
//! virtual call itself.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt::Debug;

use crate::error::Result;
use crate::kernel::{Backend, Kernel, Portable};
use crate::kex::{AliceSecret, FrodoKex, SessionKey};
use crate::param::{LevelInfo, ParameterSet, SecurityLevel};
use crate::random::RandomSource;
use crate::recommended::RecommendedParams;
use crate::xof::SeedExpander;

/// Object-safe view of a [`FrodoKex`].
pub trait KeyExchange: Debug + Send + Sync {
    /// Table key of the level.
    fn name(&self) -> &'static str;

    /// Display name of the method, e.g. `"LWE Frodo recommended"`.
    fn method_name(&self) -> &'static str;

    /// Estimated classical security in bits.
    fn estimated_classical_security(&self) -> u32;

    /// Estimated post-quantum security in bits.
    fn estimated_quantum_security(&self) -> u32;

    /// All constants of the level.
    fn level_info(&self) -> LevelInfo;

    /// Kernel bound at construction.
    fn backend(&self) -> Backend;

    /// Length of Alice's message.
    fn alice_msg_len(&self) -> usize;

    /// Length of Bob's message.
    fn bob_msg_len(&self) -> usize;

    /// See [`FrodoKex::alice_0`].
    fn alice_0(&self, rng: &mut dyn RandomSource) -> Result<(AliceSecret, Vec<u8>)>;

    /// See [`FrodoKex::bob`].
    fn bob(&self, rng: &mut dyn RandomSource, alice_msg: &[u8]) -> Result<(Vec<u8>, SessionKey)>;

    /// See [`FrodoKex::alice_1`].
    fn alice_1(&self, secret: AliceSecret, bob_msg: &[u8]) -> Result<SessionKey>;
}

impl<P: ParameterSet, K: Kernel, X: SeedExpander> KeyExchange for FrodoKex<P, K, X> {
    fn name(&self) -> &'static str {
        P::NAME
    }

    fn method_name(&self) -> &'static str {
        P::METHOD_NAME
    }

    fn estimated_classical_security(&self) -> u32 {
        P::CLASSICAL_SECURITY
    }

    fn estimated_quantum_security(&self) -> u32 {
        P::QUANTUM_SECURITY
    }

    fn level_info(&self) -> LevelInfo {
        LevelInfo::of::<P>()
    }

    fn backend(&self) -> Backend {
        K::BACKEND
    }

    fn alice_msg_len(&self) -> usize {
        self.parameters().alice_msg_len()
    }

    fn bob_msg_len(&self) -> usize {
        self.parameters().bob_msg_len()
    }

    fn alice_0(&self, rng: &mut dyn RandomSource) -> Result<(AliceSecret, Vec<u8>)> {
        FrodoKex::alice_0(self, rng)
    }

    fn bob(&self, rng: &mut dyn RandomSource, alice_msg: &[u8]) -> Result<(Vec<u8>, SessionKey)> {
        FrodoKex::bob(self, rng, alice_msg)
    }

    fn alice_1(&self, secret: AliceSecret, bob_msg: &[u8]) -> Result<SessionKey> {
        FrodoKex::alice_1(self, secret, bob_msg)
    }
}

/// Key exchange for the level called `name`, on the kernel from
/// [`Backend::detect`].
///
/// Fails with [`InvalidParameters`](crate::Error::InvalidParameters) on an
/// unknown name or an empty seed.
pub fn new_key_exchange(name: &str, seed: &[u8]) -> Result<Box<dyn KeyExchange>> {
    new_key_exchange_with_backend(name, seed, Backend::detect())
}

/// Key exchange for the level called `name`, on an explicit kernel.
///
/// Fails with [`InvalidParameters`](crate::Error::InvalidParameters) on an
/// unknown name, an empty seed, or a backend this build does not contain.
pub fn new_key_exchange_with_backend(
    name: &str,
    seed: &[u8],
    backend: Backend,
) -> Result<Box<dyn KeyExchange>> {
    match SecurityLevel::from_name(name)? {
        SecurityLevel::Recommended => build::<RecommendedParams>(seed, backend),
    }
}

fn build<P: ParameterSet>(seed: &[u8], backend: Backend) -> Result<Box<dyn KeyExchange>> {
    match backend {
        Backend::Portable => Ok(Box::new(FrodoKex::<P, Portable>::new(seed)?)),
        #[cfg(feature = "simd")]
        Backend::Wide => Ok(Box::new(FrodoKex::<P, crate::kernel::Wide>::new(seed)?)),
        #[cfg(not(feature = "simd"))]
        Backend::Wide => Err(crate::Error::invalid("the wide kernel needs the `simd` feature")),
    }
}
