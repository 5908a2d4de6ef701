//! Matrix engine: bit packing and the four products mod q.
//!
//! Matrices are dense and row-major. Bulk matrices are n×n̄ and live in a
//! `Vec`; the shared n̄×n̄ matrix is a [`SharedMatrix`]. A is never stored:
//! every product expands it one row at a time and folds that row in before
//! moving on.
//!
//! Products run in wrapping `u16` arithmetic and are reduced with `& (q - 1)`
//! once at the end.

use alloc::vec;
use alloc::vec::Vec;

use zeroize::Zeroizing;

use crate::kernel::Kernel;
use crate::param::{ParameterSet, SharedMatrix};
use crate::xof::SeedExpander;

/// Bytes needed to pack `count` values of `bits` bits
pub const fn packed_len(count: usize, bits: u32) -> usize {
    (count * bits as usize).div_ceil(8)
}

/// Packs the low `bits` bits of every value, most significant bit first, with
/// no padding between values. The final byte is zero-padded.
///
/// # Panics
///
/// If `bits` is not in `1..=16` or `out` is shorter than
/// [`packed_len`]`(values.len(), bits)`.
pub fn pack_into(out: &mut [u8], values: &[u16], bits: u32) {
    assert!((1..=16).contains(&bits));
    assert!(out.len() >= packed_len(values.len(), bits));
    let mask = (1u32 << bits) - 1;

    let mut acc = 0u32;
    let mut acc_bits = 0u32;
    let mut pos = 0;
    for &v in values {
        acc = (acc << bits) | (u32::from(v) & mask);
        acc_bits += bits;
        while acc_bits >= 8 {
            acc_bits -= 8;
            out[pos] = (acc >> acc_bits) as u8;
            pos += 1;
        }
        acc &= (1 << acc_bits) - 1;
    }
    if acc_bits > 0 {
        out[pos] = (acc << (8 - acc_bits)) as u8;
    }
}

/// [`pack_into`] a fresh buffer.
pub fn pack(values: &[u16], bits: u32) -> Vec<u8> {
    let mut out = vec![0u8; packed_len(values.len(), bits)];
    pack_into(&mut out, values, bits);
    out
}

/// Inverse of [`pack`]: reads `count` values of `bits` bits.
///
/// # Panics
///
/// If `bits` is not in `1..=16` or `bytes` is shorter than
/// [`packed_len`]`(count, bits)`.
pub fn unpack(bytes: &[u8], count: usize, bits: u32) -> Vec<u16> {
    assert!((1..=16).contains(&bits));
    let len = packed_len(count, bits);
    assert!(bytes.len() >= len);
    let mask = (1u32 << bits) - 1;

    let mut out = Vec::with_capacity(count);
    let mut acc = 0u32;
    let mut acc_bits = 0u32;
    for &byte in &bytes[..len] {
        acc = (acc << 8) | u32::from(byte);
        acc_bits += 8;
        while acc_bits >= bits && out.len() < count {
            acc_bits -= bits;
            out.push(((acc >> acc_bits) & mask) as u16);
        }
        acc &= (1 << acc_bits) - 1;
    }
    out
}

fn reduce<P: ParameterSet>(values: &mut [u16]) {
    for v in values {
        *v &= P::Q_MASK;
    }
}

/// `B = A·S + E` for n×n̄ `s` and `e`
pub(crate) fn mul_add_as_plus_e<P, K, X>(seed: &[u8], s: &[u16], e: &[u16]) -> Vec<u16>
where
    P: ParameterSet,
    K: Kernel,
    X: SeedExpander,
{
    debug_assert_eq!(s.len(), P::N_NBAR);
    debug_assert_eq!(e.len(), P::N_NBAR);

    let mut out = e.to_vec();
    let mut a_row = vec![0u16; P::N];
    for (i, out_row) in out.chunks_exact_mut(P::NBAR).enumerate() {
        X::expand_row(seed, i, &mut a_row, P::Q_MASK);
        K::mul_row_acc(out_row, &a_row, s);
    }
    reduce::<P>(&mut out);
    out
}

/// `B = Aᵗ·S + E` for n×n̄ `s` and `e`
pub(crate) fn mul_add_at_s_plus_e<P, K, X>(seed: &[u8], s: &[u16], e: &[u16]) -> Vec<u16>
where
    P: ParameterSet,
    K: Kernel,
    X: SeedExpander,
{
    debug_assert_eq!(s.len(), P::N_NBAR);
    debug_assert_eq!(e.len(), P::N_NBAR);

    let mut out = e.to_vec();
    let mut a_row = vec![0u16; P::N];
    for (k, s_row) in s.chunks_exact(P::NBAR).enumerate() {
        X::expand_row(seed, k, &mut a_row, P::Q_MASK);
        K::outer_acc(&mut out, &a_row, s_row);
    }
    reduce::<P>(&mut out);
    out
}

/// `Bᵗ·S + E` for n×n̄ `b` and `s`, n̄×n̄ `e`
pub(crate) fn mul_add_bt_s_plus_e<P, K>(
    b: &[u16],
    s: &[u16],
    e: &[u16],
) -> Zeroizing<SharedMatrix<P>>
where
    P: ParameterSet,
    K: Kernel,
{
    debug_assert_eq!(b.len(), P::N_NBAR);
    debug_assert_eq!(s.len(), P::N_NBAR);

    let mut out = Zeroizing::new(SharedMatrix::<P>::default());
    out.copy_from_slice(e);
    for (b_row, s_row) in b.chunks_exact(P::NBAR).zip(s.chunks_exact(P::NBAR)) {
        K::outer_acc(&mut out, b_row, s_row);
    }
    reduce::<P>(&mut out);
    out
}

/// `Sᵗ·B` for n×n̄ `s` and `b`
pub(crate) fn mul_st_b<P, K>(s: &[u16], b: &[u16]) -> Zeroizing<SharedMatrix<P>>
where
    P: ParameterSet,
    K: Kernel,
{
    debug_assert_eq!(b.len(), P::N_NBAR);
    debug_assert_eq!(s.len(), P::N_NBAR);

    let mut out = Zeroizing::new(SharedMatrix::<P>::default());
    for (s_row, b_row) in s.chunks_exact(P::NBAR).zip(b.chunks_exact(P::NBAR)) {
        K::outer_acc(&mut out, s_row, b_row);
    }
    reduce::<P>(&mut out);
    out
}
