//! Reconciliation of the noisy shared matrix.
//!
//! With `b = log2 q - B`, each entry splits into B key bits (the top bits,
//! rounded) and b low bits. Bob publishes one hint bit per entry saying which
//! half of its rounding interval his value fell in; Alice uses it to shift her
//! value by a quarter interval towards Bob's before rounding. The two agree
//! whenever the entries differ by at most `q / 2^(B + 2)`.

use zeroize::Zeroizing;

use crate::matrix::pack_into;
use crate::param::{KeyBytes, ParameterSet, ReconciliationHint, SharedMatrix};

struct Rounding {
    shift: u32,
    whole_mask: u16,
    half: u16,
    quarter: u16,
    key_mask: u16,
}

impl Rounding {
    const fn of<P: ParameterSet>() -> Self {
        let shift = P::LOG2_Q - P::EXTRACTED_BITS;
        Self {
            shift,
            whole_mask: ((1u32 << shift) - 1) as u16,
            half: 1 << (shift - 1),
            quarter: 1 << (shift - 2),
            key_mask: ((1u32 << P::EXTRACTED_BITS) - 1) as u16,
        }
    }

    fn hint(&self, v: u16) -> u8 {
        // 1 iff v mod whole >= half
        ((v & self.whole_mask) >> (self.shift - 1)) as u8 & 1
    }

    fn extract(&self, v: u16) -> u16 {
        (v.wrapping_add(self.half) >> self.shift) & self.key_mask
    }

    fn reconcile(&self, w: u16, hint: u8) -> u16 {
        let near_edge = (((w & self.whole_mask) + self.quarter) >> (self.shift - 1)) & 1;
        // +quarter for hint 1, -quarter for hint 0, nothing away from the edges
        let direction = (2 * u16::from(hint)).wrapping_sub(1);
        let shift = near_edge.wrapping_mul(direction).wrapping_mul(self.quarter);
        self.extract(w.wrapping_add(shift))
    }
}

/// Bob's hint bits for `v`, LSB-first within each byte, row-major.
pub(crate) fn hint<P: ParameterSet>(v: &SharedMatrix<P>) -> ReconciliationHint<P> {
    let rounding = Rounding::of::<P>();
    let mut out = ReconciliationHint::<P>::default();
    for (i, &value) in v.iter().enumerate() {
        out[i / 8] |= rounding.hint(value) << (i % 8);
    }
    out
}

fn pack_key<P: ParameterSet>(values: &SharedMatrix<P>) -> Zeroizing<KeyBytes<P>> {
    let mut key = Zeroizing::new(KeyBytes::<P>::default());
    pack_into(&mut key, values, P::EXTRACTED_BITS);
    key
}

/// Bob's key: the top B bits of every entry of `v`, rounded.
pub(crate) fn extract<P: ParameterSet>(v: &SharedMatrix<P>) -> Zeroizing<KeyBytes<P>> {
    let rounding = Rounding::of::<P>();
    let mut values = Zeroizing::new(SharedMatrix::<P>::default());
    for (out, &value) in values.iter_mut().zip(v.iter()) {
        *out = rounding.extract(value);
    }
    pack_key::<P>(&values)
}

/// Alice's key from her matrix `w` and Bob's hint.
pub(crate) fn reconcile<P: ParameterSet>(
    w: &SharedMatrix<P>,
    hint: &ReconciliationHint<P>,
) -> Zeroizing<KeyBytes<P>> {
    let rounding = Rounding::of::<P>();
    let mut values = Zeroizing::new(SharedMatrix::<P>::default());
    for (i, (out, &value)) in values.iter_mut().zip(w.iter()).enumerate() {
        let bit = (hint[i / 8] >> (i % 8)) & 1;
        *out = rounding.reconcile(value, bit);
    }
    pack_key::<P>(&values)
}
