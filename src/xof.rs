//! Seed expansion for the public matrix A
//!
//! Row `i` of A is SHAKE128(le16(i) || seed), read as little-endian 16-bit
//! words and reduced mod q. Rows are independent, so A is produced one row at
//! a time and consumed on the fly.

use core::fmt::Debug;

use sha3::Shake128;
use sha3::digest::{ExtendableOutput, Update, XofReader};

/// Deterministic `seed, row -> row of A`
pub trait SeedExpander: Default + Clone + Copy + Debug + Send + Sync + 'static {
    /// Short label, used in logs
    const NAME: &'static str;

    /// Writes row `row` of A into `out`, every value masked with `q_mask`.
    fn expand_row(seed: &[u8], row: usize, out: &mut [u16], q_mask: u16);
}

/// SHAKE128 row expander
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Shake128Expander;

impl SeedExpander for Shake128Expander {
    const NAME: &'static str = "shake128";

    fn expand_row(seed: &[u8], row: usize, out: &mut [u16], q_mask: u16) {
        debug_assert!(row <= usize::from(u16::MAX));
        let mut hasher = Shake128::default();
        hasher.update(&(row as u16).to_le_bytes());
        hasher.update(seed);
        let mut reader = hasher.finalize_xof();

        const CHUNK: usize = 32;
        let mut bytes = [0u8; 2 * CHUNK];
        for values in out.chunks_mut(CHUNK) {
            let bytes = &mut bytes[..2 * values.len()];
            reader.read(bytes);
            for (v, pair) in values.iter_mut().zip(bytes.chunks_exact(2)) {
                *v = u16::from_le_bytes([pair[0], pair[1]]) & q_mask;
            }
        }
    }
}
