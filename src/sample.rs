//! Error sampling.
//!
//! Each sample consumes two bytes of the random source, read little-endian;
//! only the low `SAMPLER_BITS` bits are used. The low bit is the sign and the
//! rest is the magnitude draw, mapped through the level's CDF table by the
//! kernel.

use alloc::vec;
use alloc::vec::Vec;

use zeroize::Zeroizing;

use crate::ParameterSet;
use crate::error::Result;
use crate::kernel::Kernel;
use crate::random::RandomSource;

/// Bytes of randomness per sample
pub(crate) const BYTES_PER_SAMPLE: usize = 2;

const fn draw_mask<P: ParameterSet>() -> u16 {
    ((1u32 << P::SAMPLER_BITS) - 1) as u16
}

/// Draws `count` error values mod q with a single read from `rng`.
pub(crate) fn sample_matrix<P, K, R>(rng: &mut R, count: usize) -> Result<Zeroizing<Vec<u16>>>
where
    P: ParameterSet,
    K: Kernel,
    R: RandomSource + ?Sized,
{
    let mut bytes = Zeroizing::new(vec![0u8; BYTES_PER_SAMPLE * count]);
    rng.fill(&mut bytes)?;

    let draws: Zeroizing<Vec<u16>> = Zeroizing::new(
        bytes
            .chunks_exact(BYTES_PER_SAMPLE)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect(),
    );

    let mut out = Zeroizing::new(vec![0u16; count]);
    K::sample(&mut out, &draws, P::CDF_TABLE, draw_mask::<P>(), P::Q_MASK);
    Ok(out)
}
