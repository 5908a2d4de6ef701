use hybrid_array::typenum::{U8, U32, U64};
use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::{CryptoRng, Error, RngCore, SeedableRng};

use crate::ParameterSet;
use crate::recommended::RecommendedParams;

/// Deterministic tiny RNG for repeatable tests
pub struct TestRng {
    rng: ChaCha8Rng,
}

impl TestRng {
    pub fn new() -> Self {
        Self::with_seed(0xdead_beef)
    }
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
    pub fn gen_usize(&mut self, upper: usize) -> usize {
        (self.next_u32() as usize) % upper
    }
    /// uniform values in [0, 2^bits)
    pub fn values(&mut self, len: usize, bits: u32) -> std::vec::Vec<u16> {
        (0..len)
            .map(|_| (self.next_u32() & ((1 << bits) - 1)) as u16)
            .collect()
    }
}

impl Default for TestRng {
    fn default() -> Self {
        Self::new()
    }
}

impl RngCore for TestRng {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }
    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest)
    }
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.rng.try_fill_bytes(dest)
    }
}

impl CryptoRng for TestRng {}

fn drained() -> Error {
    Error::from(core::num::NonZeroU32::new(Error::CUSTOM_START).unwrap())
}

/// A source that never delivers
pub struct ExhaustedRng;

impl RngCore for ExhaustedRng {
    fn next_u32(&mut self) -> u32 {
        panic!("exhausted")
    }
    fn next_u64(&mut self) -> u64 {
        panic!("exhausted")
    }
    fn fill_bytes(&mut self, _dest: &mut [u8]) {
        panic!("exhausted")
    }
    fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), Error> {
        Err(drained())
    }
}

impl CryptoRng for ExhaustedRng {}

/// Delivers `remaining` bytes, then fails
pub struct LimitedRng {
    inner: TestRng,
    remaining: usize,
}

impl LimitedRng {
    pub fn new(remaining: usize) -> Self {
        Self {
            inner: TestRng::new(),
            remaining,
        }
    }
}

impl RngCore for LimitedRng {
    fn next_u32(&mut self) -> u32 {
        let mut buf = [0u8; 4];
        self.fill_bytes(&mut buf);
        u32::from_le_bytes(buf)
    }
    fn next_u64(&mut self) -> u64 {
        let mut buf = [0u8; 8];
        self.fill_bytes(&mut buf);
        u64::from_le_bytes(buf)
    }
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.try_fill_bytes(dest).expect("limited rng drained")
    }
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        if dest.len() > self.remaining {
            self.remaining = 0;
            return Err(drained());
        }
        self.remaining -= dest.len();
        self.inner.try_fill_bytes(dest)
    }
}

impl CryptoRng for LimitedRng {}

/// The recommended noise and modulus on a 64-dimensional A, so that
/// statistical tests can run many exchanges quickly
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToyParams;

impl ParameterSet for ToyParams {
    const NAME: &'static str = "toy";
    const METHOD_NAME: &'static str = "LWE Frodo toy";
    const CLASSICAL_SECURITY: u32 = 0;
    const QUANTUM_SECURITY: u32 = 0;
    const LOG2_Q: u32 = 15;
    const N: usize = 64;
    const NBAR: usize = 8;
    const EXTRACTED_BITS: u32 = 4;
    const KEY_BITS: usize = 256;
    const SAMPLER_BITS: u32 = 12;
    const CDF_TABLE: &'static [u16] = RecommendedParams::CDF_TABLE;

    type NbarNbar = U64;
    type HintBytes = U8;
    type KeyBytes = U32;
}
