//! Frodo key exchange orchestration.
//!
//! Three steps, each a method of [`FrodoKex`]:
//! - [`alice_0`](FrodoKex::alice_0): Alice's first message and her secret
//! - [`bob`](FrodoKex::bob): Bob's reply and his session key
//! - [`alice_1`](FrodoKex::alice_1): Alice's session key
//!
//! Every message is length-checked before it is unpacked. A failed step
//! returns no key material, and every secret matrix is wiped on drop.
//!
//! Disagreement between the two keys is not detected here.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;
use core::marker::PhantomData;

use subtle::{Choice, ConstantTimeEq};
use zeroize::Zeroizing;

use crate::error::{Error, MessageKind, Result};
use crate::kernel::{Kernel, Portable};
use crate::matrix::{
    mul_add_as_plus_e, mul_add_at_s_plus_e, mul_add_bt_s_plus_e, mul_st_b, pack_into, unpack,
};
use crate::param::{ParameterSet, Parameters, ReconciliationHint};
use crate::random::RandomSource;
use crate::reconcile::{extract, hint, reconcile};
use crate::sample::sample_matrix;
use crate::xof::{SeedExpander, Shake128Expander};

/// Alice's state between her two steps: the secret matrix `S_A`.
///
/// Single use: [`FrodoKex::alice_1`] takes it by value. Wiped on drop.
pub struct AliceSecret {
    level: &'static str,
    s: Zeroizing<Vec<u16>>,
}

impl AliceSecret {
    /// Level the secret was generated for.
    pub fn level(&self) -> &'static str {
        self.level
    }
}

impl fmt::Debug for AliceSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AliceSecret")
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}

/// Shared secret produced by [`FrodoKex::bob`] and [`FrodoKex::alice_1`].
///
/// Equality is constant time. Wiped on drop.
pub struct SessionKey(Zeroizing<Vec<u8>>);

impl SessionKey {
    fn new(bytes: &[u8]) -> Self {
        Self(Zeroizing::new(bytes.to_vec()))
    }

    /// Key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Key length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the key is empty, which no level produces.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for SessionKey {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl ConstantTimeEq for SessionKey {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0.as_slice().ct_eq(other.0.as_slice())
    }
}

impl PartialEq for SessionKey {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for SessionKey {}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKey")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

fn check_len(kind: MessageKind, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        tracing::warn!(%kind, expected, actual, "rejecting malformed message");
        return Err(Error::MalformedMessage {
            kind,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Frodo key exchange for level `P`, kernel `K` and seed expander `X`
pub struct FrodoKex<P: ParameterSet, K: Kernel = Portable, X: SeedExpander = Shake128Expander> {
    params: Parameters<P>,
    _marker: PhantomData<(K, X)>,
}

impl<P: ParameterSet, K: Kernel, X: SeedExpander> FrodoKex<P, K, X> {
    /// Binds level `P` to the seed of the public matrix. Fails on an empty
    /// seed.
    pub fn new(seed: &[u8]) -> Result<Self> {
        Parameters::new(seed).map(Self::from_parameters)
    }

    /// Wraps already validated parameters.
    pub fn from_parameters(params: Parameters<P>) -> Self {
        tracing::debug!(
            params = P::NAME,
            kernel = K::BACKEND.name(),
            expander = X::NAME,
            "new exchange"
        );
        Self {
            params,
            _marker: PhantomData,
        }
    }

    /// Level and seed of this exchange.
    pub fn parameters(&self) -> &Parameters<P> {
        &self.params
    }

    /// Alice, round 1: generate `S_A` and the message `seed || B_A`.
    ///
    /// # Algorithm
    /// 1. Sample S_A, then E_A (n×n̄ each)
    /// 2. B_A = A·S_A + E_A, A expanded from the parameter seed
    /// 3. Message = seed || pack(B_A)
    #[tracing::instrument(level = "debug", skip_all, fields(params = P::NAME, kernel = K::BACKEND.name()))]
    pub fn alice_0<R: RandomSource + ?Sized>(&self, rng: &mut R) -> Result<(AliceSecret, Vec<u8>)> {
        // Step 1: Secret and error
        let s = sample_matrix::<P, K, R>(rng, P::N_NBAR)?;
        let e = sample_matrix::<P, K, R>(rng, P::N_NBAR)?;

        // Step 2: Public matrix
        let seed = self.params.seed();
        let b = mul_add_as_plus_e::<P, K, X>(seed, &s, &e);

        // Step 3: Message
        let mut msg = vec![0u8; self.params.alice_msg_len()];
        let (seed_part, b_part) = msg.split_at_mut(seed.len());
        seed_part.copy_from_slice(seed);
        pack_into(b_part, &b, P::LOG2_Q);

        let secret = AliceSecret {
            level: P::NAME,
            s,
        };
        Ok((secret, msg))
    }

    /// Bob: answer Alice's message with `B_B || C` and derive the key.
    ///
    /// # Algorithm
    /// 1. Check the length, split into seed_A and B_A
    /// 2. Sample S_B, E_B (n×n̄) and E'' (n̄×n̄), in that order
    /// 3. B_B = Aᵗ·S_B + E_B, A expanded from seed_A
    /// 4. V = B_Aᵗ·S_B + E''
    /// 5. Message = pack(B_B) || hint(V), key = extract(V)
    #[tracing::instrument(level = "debug", skip_all, fields(params = P::NAME, kernel = K::BACKEND.name()))]
    pub fn bob<R: RandomSource + ?Sized>(
        &self,
        rng: &mut R,
        alice_msg: &[u8],
    ) -> Result<(Vec<u8>, SessionKey)> {
        // Step 1: Parse
        check_len(MessageKind::Alice, self.params.alice_msg_len(), alice_msg.len())?;
        let (seed_a, packed_b_a) = alice_msg.split_at(self.params.seed().len());
        let b_a = unpack(packed_b_a, P::N_NBAR, P::LOG2_Q);

        // Step 2: Secret and errors
        let s = sample_matrix::<P, K, R>(rng, P::N_NBAR)?;
        let e = sample_matrix::<P, K, R>(rng, P::N_NBAR)?;
        let e2 = sample_matrix::<P, K, R>(rng, P::NBAR * P::NBAR)?;

        // Step 3: Public matrix
        let b_b = mul_add_at_s_plus_e::<P, K, X>(seed_a, &s, &e);

        // Step 4: Shared matrix
        let v = mul_add_bt_s_plus_e::<P, K>(&b_a, &s, &e2);

        // Step 5: Message and key
        let mut msg = vec![0u8; self.params.bob_msg_len()];
        let (b_part, hint_part) = msg.split_at_mut(P::PUB_LEN);
        pack_into(b_part, &b_b, P::LOG2_Q);
        hint_part.copy_from_slice(&hint::<P>(&v));

        let key = extract::<P>(&v);
        Ok((msg, SessionKey::new(&key)))
    }

    /// Alice, round 2: derive the key from Bob's message, consuming the secret.
    ///
    /// # Algorithm
    /// 1. Check the secret's level and the message length
    /// 2. W = S_Aᵗ·B_B
    /// 3. key = reconcile(W, C)
    #[tracing::instrument(level = "debug", skip_all, fields(params = P::NAME, kernel = K::BACKEND.name()))]
    pub fn alice_1(&self, secret: AliceSecret, bob_msg: &[u8]) -> Result<SessionKey> {
        // Step 1: Parse
        if secret.level != P::NAME || secret.s.len() != P::N_NBAR {
            return Err(Error::invalid(alloc::format!(
                "secret of level {:?} used with level {:?}",
                secret.level,
                P::NAME
            )));
        }
        check_len(MessageKind::Bob, self.params.bob_msg_len(), bob_msg.len())?;
        let (packed_b_b, hint_bytes) = bob_msg.split_at(P::PUB_LEN);
        let b_b = unpack(packed_b_b, P::N_NBAR, P::LOG2_Q);
        let c = ReconciliationHint::<P>::try_from(hint_bytes).map_err(|_| Error::MalformedMessage {
            kind: MessageKind::Bob,
            expected: P::REC_HINT_LEN,
            actual: hint_bytes.len(),
        })?;

        // Step 2: Shared matrix
        let w = mul_st_b::<P, K>(&secret.s, &b_b);

        // Step 3: Key
        let key = reconcile::<P>(&w, &c);
        Ok(SessionKey::new(&key))
    }
}

impl<P: ParameterSet, K: Kernel, X: SeedExpander> fmt::Debug for FrodoKex<P, K, X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrodoKex")
            .field("params", &self.params)
            .field("kernel", &K::BACKEND)
            .field("expander", &X::NAME)
            .finish()
    }
}
