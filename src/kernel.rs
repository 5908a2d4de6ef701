//! Arithmetic kernels behind the matrix engine and the error sampler.
//!
//! [`Portable`] runs scalar wrapping `u16` arithmetic. [`Wide`] runs the same
//! loops eight lanes at a time through `wide::i16x8`. Because q divides 2^16,
//! wrapping arithmetic followed by a final `& (q - 1)` is arithmetic mod q on
//! both paths, so the two kernels produce bit-identical output.
//!
//! The kernel is a type parameter of the driver: picking one happens once, at
//! construction, and every call after that is monomorphized.
//!
//! Critical: [`Kernel::sample`] touches secrets. No branch or memory access may
//! depend on a draw.

use core::fmt::Debug;

/// Matrix inner loops and the inverse-CDF sampler.
pub trait Kernel: Default + Clone + Copy + Debug + Send + Sync + 'static {
    /// Which [`Backend`] this kernel implements.
    const BACKEND: Backend;

    /// `acc[j] += Σ_k lhs[k] · rhs[k·w + j]` with `w = acc.len()`, wrapping.
    fn mul_row_acc(acc: &mut [u16], lhs: &[u16], rhs: &[u16]);

    /// `acc[i·w + j] += col[i] · row[j]` with `w = row.len()`, wrapping.
    fn outer_acc(acc: &mut [u16], col: &[u16], row: &[u16]);

    /// Maps raw random words to signed samples mod q.
    ///
    /// The low bit of `draw & draw_mask` is the sign, the rest is the magnitude
    /// draw; the sample is the number of `cdf` entries below that draw. Every
    /// entry is compared, whatever the draw.
    fn sample(out: &mut [u16], draws: &[u16], cdf: &[u16], draw_mask: u16, q_mask: u16);
}

/// Which kernel backs an exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Scalar fixed-width arithmetic, available everywhere.
    Portable,
    /// Eight-lane SIMD through the `wide` crate (`simd` feature).
    Wide,
}

impl Backend {
    /// The fastest kernel this process can run.
    ///
    /// With `std` the CPU is probed once and the answer is cached for the
    /// life of the process; without it the answer follows the compile target.
    pub fn detect() -> Self {
        #[cfg(feature = "std")]
        {
            static DETECTED: std::sync::OnceLock<Backend> = std::sync::OnceLock::new();
            *DETECTED.get_or_init(|| {
                let backend = probe();
                tracing::debug!(backend = backend.name(), "selected arithmetic kernel");
                backend
            })
        }
        #[cfg(not(feature = "std"))]
        {
            probe()
        }
    }

    /// Whether this build contains the kernel.
    pub fn is_compiled(self) -> bool {
        match self {
            Backend::Portable => true,
            Backend::Wide => cfg!(feature = "simd"),
        }
    }

    /// Short label, used in logs.
    pub fn name(self) -> &'static str {
        match self {
            Backend::Portable => "portable",
            Backend::Wide => "wide",
        }
    }
}

fn probe() -> Backend {
    #[cfg(all(feature = "simd", feature = "std", any(target_arch = "x86", target_arch = "x86_64")))]
    {
        if std::is_x86_feature_detected!("sse2") {
            return Backend::Wide;
        }
    }
    #[cfg(all(feature = "simd", feature = "std", target_arch = "aarch64"))]
    {
        if std::arch::is_aarch64_feature_detected!("neon") {
            return Backend::Wide;
        }
    }
    #[cfg(all(
        feature = "simd",
        not(all(feature = "std", any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))
    ))]
    {
        if cfg!(any(target_feature = "sse2", target_feature = "neon", target_feature = "simd128")) {
            return Backend::Wide;
        }
    }
    Backend::Portable
}

/// Scalar kernel.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Portable;

impl Kernel for Portable {
    const BACKEND: Backend = Backend::Portable;

    fn mul_row_acc(acc: &mut [u16], lhs: &[u16], rhs: &[u16]) {
        let w = acc.len();
        debug_assert_eq!(lhs.len() * w, rhs.len());
        for (&l, rhs_row) in lhs.iter().zip(rhs.chunks_exact(w)) {
            for (a, &r) in acc.iter_mut().zip(rhs_row) {
                *a = a.wrapping_add(l.wrapping_mul(r));
            }
        }
    }

    fn outer_acc(acc: &mut [u16], col: &[u16], row: &[u16]) {
        let w = row.len();
        debug_assert_eq!(col.len() * w, acc.len());
        for (&c, acc_row) in col.iter().zip(acc.chunks_exact_mut(w)) {
            for (a, &r) in acc_row.iter_mut().zip(row) {
                *a = a.wrapping_add(c.wrapping_mul(r));
            }
        }
    }

    fn sample(out: &mut [u16], draws: &[u16], cdf: &[u16], draw_mask: u16, q_mask: u16) {
        debug_assert_eq!(out.len(), draws.len());
        for (o, &draw) in out.iter_mut().zip(draws) {
            let draw = draw & draw_mask;
            let sign = draw & 1;
            let magnitude = draw >> 1;
            let mut sample = 0u16;
            for &threshold in cdf {
                // both operands fit in 15 bits: the top bit is set iff threshold < magnitude
                sample += threshold.wrapping_sub(magnitude) >> 15;
            }
            // negates iff sign == 1
            *o = ((sign.wrapping_neg() ^ sample).wrapping_add(sign)) & q_mask;
        }
    }
}

#[cfg(feature = "simd")]
pub use self::simd::Wide;

#[cfg(feature = "simd")]
mod simd {
    use wide::i16x8;

    use super::{Backend, Kernel, Portable};

    const LANES: usize = 8;

    #[inline(always)]
    fn load(src: &[u16]) -> i16x8 {
        i16x8::new(core::array::from_fn(|lane| src[lane] as i16))
    }

    #[inline(always)]
    fn store(v: i16x8, dst: &mut [u16]) {
        for (d, s) in dst[..LANES].iter_mut().zip(v.to_array()) {
            *d = s as u16;
        }
    }

    /// Eight-lane kernel.
    #[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Wide;

    impl Kernel for Wide {
        const BACKEND: Backend = Backend::Wide;

        fn mul_row_acc(acc: &mut [u16], lhs: &[u16], rhs: &[u16]) {
            let w = acc.len();
            debug_assert_eq!(lhs.len() * w, rhs.len());
            let split = w - w % LANES;

            for base in (0..split).step_by(LANES) {
                let mut sum = load(&acc[base..]);
                for (k, &l) in lhs.iter().enumerate() {
                    sum = sum + i16x8::splat(l as i16) * load(&rhs[k * w + base..]);
                }
                store(sum, &mut acc[base..]);
            }

            for j in split..w {
                let mut a = acc[j];
                for (k, &l) in lhs.iter().enumerate() {
                    a = a.wrapping_add(l.wrapping_mul(rhs[k * w + j]));
                }
                acc[j] = a;
            }
        }

        fn outer_acc(acc: &mut [u16], col: &[u16], row: &[u16]) {
            let w = row.len();
            debug_assert_eq!(col.len() * w, acc.len());
            let split = w - w % LANES;

            for base in (0..split).step_by(LANES) {
                let r = load(&row[base..]);
                for (&c, acc_row) in col.iter().zip(acc.chunks_exact_mut(w)) {
                    let sum = load(&acc_row[base..]) + i16x8::splat(c as i16) * r;
                    store(sum, &mut acc_row[base..]);
                }
            }

            if split < w {
                for (&c, acc_row) in col.iter().zip(acc.chunks_exact_mut(w)) {
                    for (a, &r) in acc_row[split..].iter_mut().zip(&row[split..]) {
                        *a = a.wrapping_add(c.wrapping_mul(r));
                    }
                }
            }
        }

        fn sample(out: &mut [u16], draws: &[u16], cdf: &[u16], draw_mask: u16, q_mask: u16) {
            debug_assert_eq!(out.len(), draws.len());
            let split = out.len() - out.len() % LANES;

            let draw_mask_v = i16x8::splat(draw_mask as i16);
            let q_mask_v = i16x8::splat(q_mask as i16);
            let low_15 = i16x8::splat(i16::MAX);
            let one = i16x8::splat(1);
            let zero = i16x8::splat(0);

            for base in (0..split).step_by(LANES) {
                let draw = load(&draws[base..]) & draw_mask_v;
                let sign = draw & one;
                let magnitude = (draw >> 1_i32) & low_15;
                let mut sample = zero;
                for &threshold in cdf {
                    // arithmetic shift: -1 iff threshold < magnitude
                    sample = sample - ((i16x8::splat(threshold as i16) - magnitude) >> 15_i32);
                }
                let negated = ((zero - sign) ^ sample) + sign;
                store(negated & q_mask_v, &mut out[base..]);
            }

            Portable::sample(&mut out[split..], &draws[split..], cdf, draw_mask, q_mask);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParameterSet;
    use crate::recommended::RecommendedParams;
    use crate::test_util::TestRng;
    use std::vec;

    const CDF: &[u16] = RecommendedParams::CDF_TABLE;
    const DRAW_MASK: u16 = 0x0fff;
    const Q_MASK: u16 = 0x7fff;

    fn draw(magnitude: u16, sign: u16) -> u16 {
        (magnitude << 1) | sign
    }

    #[test]
    fn portable_sampler_follows_the_table() {
        let draws = [
            draw(0, 0),
            draw(602, 0),
            draw(603, 0),
            draw(1521, 1),
            draw(1522, 1),
            draw(2046, 0),
            draw(2047, 1),
            draw(0, 1),
        ];
        let mut out = [0u16; 8];
        Portable::sample(&mut out, &draws, CDF, DRAW_MASK, Q_MASK);
        assert_eq!(out, [0, 0, 1, 0x8000 - 1, 0x8000 - 2, 4, 0x8000 - 5, 0]);
    }

    #[test]
    fn sampler_ignores_bits_above_precision() {
        let mut out = [0u16; 2];
        Portable::sample(&mut out, &[draw(603, 0), 0xf000 | draw(603, 0)], CDF, DRAW_MASK, Q_MASK);
        assert_eq!(out[0], out[1]);
    }

    #[test]
    fn backend_names() {
        assert_eq!(Backend::Portable.name(), "portable");
        assert_eq!(Backend::Wide.name(), "wide");
        assert!(Backend::Portable.is_compiled());
        assert!(Backend::detect().is_compiled());
        assert_eq!(Backend::detect(), Backend::detect());
    }

    #[test]
    fn portable_products_match_definition() {
        let mut rng = TestRng::new();
        let (n, w) = (13, 5);
        let lhs = rng.values(n, 15);
        let rhs = rng.values(n * w, 15);
        let mut acc = rng.values(w, 15);
        let start = acc.clone();

        Portable::mul_row_acc(&mut acc, &lhs, &rhs);
        for j in 0..w {
            let expected = (0..n).fold(u64::from(start[j]), |s, k| {
                s + u64::from(lhs[k]) * u64::from(rhs[k * w + j])
            });
            assert_eq!(acc[j] & Q_MASK, (expected & u64::from(Q_MASK)) as u16);
        }

        let col = rng.values(n, 15);
        let row = rng.values(w, 15);
        let mut acc = vec![0u16; n * w];
        Portable::outer_acc(&mut acc, &col, &row);
        for i in 0..n {
            for j in 0..w {
                let expected = u32::from(col[i]) * u32::from(row[j]);
                assert_eq!(acc[i * w + j] & Q_MASK, (expected & u32::from(Q_MASK)) as u16);
            }
        }
    }

    #[cfg(feature = "simd")]
    mod wide_matches_portable {
        use super::*;

        fn check_products(n: usize, w: usize) {
            let mut rng = TestRng::with_seed((n * 31 + w) as u64);
            let lhs = rng.values(n, 16);
            let rhs = rng.values(n * w, 16);
            let start = rng.values(w, 16);

            let mut a = start.clone();
            let mut b = start.clone();
            Portable::mul_row_acc(&mut a, &lhs, &rhs);
            Wide::mul_row_acc(&mut b, &lhs, &rhs);
            assert_eq!(a, b, "mul_row_acc n={n} w={w}");

            let row = rng.values(w, 16);
            let start = rng.values(n * w, 16);
            let mut a = start.clone();
            let mut b = start;
            Portable::outer_acc(&mut a, &lhs, &row);
            Wide::outer_acc(&mut b, &lhs, &row);
            assert_eq!(a, b, "outer_acc n={n} w={w}");
        }

        #[test]
        fn products_with_full_lanes() {
            check_products(752, 8);
            check_products(8, 8);
            check_products(40, 16);
        }

        #[test]
        fn products_with_lane_tails() {
            check_products(17, 3);
            check_products(9, 11);
            check_products(5, 1);
        }

        #[test]
        fn sampler_on_every_draw() {
            let draws: std::vec::Vec<u16> = (0..=u16::MAX).collect();
            let mut a = vec![0u16; draws.len()];
            let mut b = vec![0u16; draws.len()];
            Portable::sample(&mut a, &draws, CDF, DRAW_MASK, Q_MASK);
            Wide::sample(&mut b, &draws, CDF, DRAW_MASK, Q_MASK);
            assert_eq!(a, b);
        }

        #[test]
        fn sampler_with_lane_tail() {
            let mut rng = TestRng::new();
            let draws = rng.values(37, 16);
            let mut a = vec![0u16; 37];
            let mut b = vec![0u16; 37];
            Portable::sample(&mut a, &draws, CDF, DRAW_MASK, Q_MASK);
            Wide::sample(&mut b, &draws, CDF, DRAW_MASK, Q_MASK);
            assert_eq!(a, b);
        }
    }
}
