//! Random byte source consumed by the error sampler.

use rand_core::{CryptoRng, RngCore};

use crate::error::{Error, Result};

/// Cryptographically secure random byte source.
///
/// Implemented for every `rand_core` generator marked [`CryptoRng`]. The trait
/// is object safe so that `&mut dyn RandomSource` can cross the
/// [`KeyExchange`](crate::KeyExchange) boundary.
pub trait RandomSource {
    /// Fills `buf` completely, or fails with [`Error::RandomSourceFailure`].
    fn fill(&mut self, buf: &mut [u8]) -> Result<()>;
}

impl<R: RngCore + CryptoRng> RandomSource for R {
    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        self.try_fill_bytes(buf).map_err(|err| {
            tracing::warn!(%err, "random source failed");
            Error::RandomSourceFailure
        })
    }
}
