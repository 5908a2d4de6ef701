use alloc::vec::Vec;
use core::fmt::{self, Debug};
use core::marker::PhantomData;
use core::str::FromStr;

use hybrid_array::{Array, ArraySize, typenum::Unsigned};
use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// Frodo parameter set trait defining one security level
///
/// All constants are fixed at compile time, so the sampler, the matrix engine
/// and the driver are monomorphized once per level. Implementations exist for
/// the levels of the [`SecurityLevel`] table.
pub trait ParameterSet:
    Default + Clone + Copy + Debug + PartialEq + Eq + Send + Sync + 'static
{
    /// Table key of the level, e.g. `"recommended"`
    const NAME: &'static str;

    /// Display name of the method
    const METHOD_NAME: &'static str;

    /// Estimated classical security in bits
    const CLASSICAL_SECURITY: u32;

    /// Estimated post-quantum security in bits
    const QUANTUM_SECURITY: u32;

    /// log2 of the modulus q, at most 16
    const LOG2_Q: u32;

    /// dimension of the public matrix A, denoted `n`
    const N: usize;

    /// width of the secret and error matrices, denoted `n̄`
    const NBAR: usize;

    /// key bits extracted from each entry of the n̄×n̄ matrix, denoted `B`
    const EXTRACTED_BITS: u32;

    /// length of the session key in bits: n̄ · n̄ · B
    const KEY_BITS: usize;

    /// random bits consumed per error sample: one sign bit and the magnitude draw
    const SAMPLER_BITS: u32;

    /// cumulative distribution of |e| over [0, 2^(SAMPLER_BITS - 1))
    const CDF_TABLE: &'static [u16];

    /// n̄ · n̄
    type NbarNbar: ArraySize;

    /// reconciliation hint length in bytes: ceil(n̄² / 8)
    type HintBytes: ArraySize;

    /// session key length in bytes: KEY_BITS / 8
    type KeyBytes: ArraySize;

    /// the modulus q = 2^LOG2_Q
    const Q: u32 = 1 << Self::LOG2_Q;

    /// q - 1, so that reduction mod q is a bitwise and
    const Q_MASK: u16 = ((1u32 << Self::LOG2_Q) - 1) as u16;

    /// entries of an n×n̄ matrix
    const N_NBAR: usize = Self::N * Self::NBAR;

    /// packed n×n̄ matrix length in bytes: ceil(n · n̄ · log2 q / 8)
    const PUB_LEN: usize = (Self::N * Self::NBAR * Self::LOG2_Q as usize).div_ceil(8);

    /// reconciliation hint length in bytes, one bit per n̄×n̄ entry
    const REC_HINT_LEN: usize = (Self::NBAR * Self::NBAR).div_ceil(8);

    /// session key length in bytes
    const KEY_LEN: usize = Self::KEY_BITS / 8;
}

/// n̄×n̄ matrix, row-major
pub type SharedMatrix<P> = Array<u16, <P as ParameterSet>::NbarNbar>;

/// reconciliation hint, denoted `C`
pub type ReconciliationHint<P> = Array<u8, <P as ParameterSet>::HintBytes>;

/// extracted key bits packed at B bits per entry
pub type KeyBytes<P> = Array<u8, <P as ParameterSet>::KeyBytes>;

/// Checks the invariants tying the constants of a level together.
pub(crate) fn check<P: ParameterSet>() -> Result<()> {
    if P::N == 0 || P::NBAR == 0 {
        return Err(Error::invalid("dimensions must be non-zero"));
    }
    if P::LOG2_Q > 16 || P::EXTRACTED_BITS == 0 || P::LOG2_Q < P::EXTRACTED_BITS + 2 {
        return Err(Error::invalid("log2 q must be at most 16 and leave two rounding bits"));
    }
    if P::KEY_BITS != P::NBAR * P::NBAR * P::EXTRACTED_BITS as usize || P::KEY_BITS % 8 != 0 {
        return Err(Error::invalid("key bits must equal n̄² · B and be a multiple of 8"));
    }
    if P::NbarNbar::USIZE != P::NBAR * P::NBAR
        || P::HintBytes::USIZE != P::REC_HINT_LEN
        || P::KeyBytes::USIZE != P::KEY_LEN
    {
        return Err(Error::invalid("array sizes disagree with the dimensions"));
    }
    if !(2..=16).contains(&P::SAMPLER_BITS) {
        return Err(Error::invalid("sampler precision must be 2..=16 bits"));
    }

    let table = P::CDF_TABLE;
    let Some(&last) = table.last() else {
        return Err(Error::invalid("cdf table is empty"));
    };
    if table.windows(2).any(|w| w[0] > w[1]) {
        return Err(Error::invalid("cdf table must be non-decreasing"));
    }
    if u32::from(last) != (1 << (P::SAMPLER_BITS - 1)) - 1 {
        return Err(Error::invalid("cdf table must end at the largest magnitude draw"));
    }
    if u32::from(last) >= P::Q {
        return Err(Error::invalid("cdf table entries must be below q"));
    }
    Ok(())
}

/// Closed table of named security levels.
///
/// Adding a level adds a variant; existing rows never change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum SecurityLevel {
    /// n = 752, n̄ = 8, q = 2^15, B = 4: a 256-bit key
    Recommended,
}

impl SecurityLevel {
    /// Every level of the table.
    pub const ALL: &'static [SecurityLevel] = &[SecurityLevel::Recommended];

    /// Looks a level up by its table key.
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|level| level.name() == name)
            .ok_or_else(|| Error::invalid(alloc::format!("unknown security level {name:?}")))
    }

    /// Table key of the level.
    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// Constants of the level.
    pub fn info(self) -> LevelInfo {
        match self {
            SecurityLevel::Recommended => LevelInfo::of::<crate::recommended::RecommendedParams>(),
        }
    }
}

impl FromStr for SecurityLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Runtime view of the constants of a [`ParameterSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelInfo {
    /// Table key
    pub name: &'static str,
    /// Display name of the method
    pub method_name: &'static str,
    /// Estimated classical security in bits
    pub classical_security: u32,
    /// Estimated post-quantum security in bits
    pub quantum_security: u32,
    /// log2 of the modulus
    pub log2_q: u32,
    /// dimension of A
    pub n: usize,
    /// width of the secret matrices
    pub nbar: usize,
    /// key bits per n̄×n̄ entry
    pub extracted_bits: u32,
    /// session key length in bits
    pub key_bits: usize,
    /// random bits per error sample
    pub sampler_bits: u32,
    /// noise distribution
    pub cdf_table: &'static [u16],
    /// packed public matrix length in bytes
    pub pub_len: usize,
    /// reconciliation hint length in bytes
    pub rec_hint_len: usize,
}

impl LevelInfo {
    /// Collects the constants of `P`.
    pub const fn of<P: ParameterSet>() -> Self {
        Self {
            name: P::NAME,
            method_name: P::METHOD_NAME,
            classical_security: P::CLASSICAL_SECURITY,
            quantum_security: P::QUANTUM_SECURITY,
            log2_q: P::LOG2_Q,
            n: P::N,
            nbar: P::NBAR,
            extracted_bits: P::EXTRACTED_BITS,
            key_bits: P::KEY_BITS,
            sampler_bits: P::SAMPLER_BITS,
            cdf_table: P::CDF_TABLE,
            pub_len: P::PUB_LEN,
            rec_hint_len: P::REC_HINT_LEN,
        }
    }
}

/// A level bound to the caller's seed for the public matrix.
///
/// The seed is wiped when the value is dropped.
pub struct Parameters<P: ParameterSet> {
    seed: Zeroizing<Vec<u8>>,
    _marker: PhantomData<P>,
}

impl<P: ParameterSet> Parameters<P> {
    /// Binds `seed` to level `P`. Fails on an empty seed.
    pub fn new(seed: &[u8]) -> Result<Self> {
        check::<P>()?;
        if seed.is_empty() {
            return Err(Error::invalid("seed must not be empty"));
        }
        Ok(Self {
            seed: Zeroizing::new(seed.to_vec()),
            _marker: PhantomData,
        })
    }

    /// Seed from which Alice expands A.
    pub fn seed(&self) -> &[u8] {
        &self.seed
    }

    /// Table key of the level.
    pub fn name(&self) -> &'static str {
        P::NAME
    }

    /// Length of Alice's message: seed || B_A
    pub fn alice_msg_len(&self) -> usize {
        self.seed.len() + P::PUB_LEN
    }

    /// Length of Bob's message: B_B || C
    pub fn bob_msg_len(&self) -> usize {
        P::PUB_LEN + P::REC_HINT_LEN
    }
}

impl<P: ParameterSet> Debug for Parameters<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameters")
            .field("name", &P::NAME)
            .field("seed_len", &self.seed.len())
            .finish()
    }
}
