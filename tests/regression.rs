//! Pinned regression vector for the "recommended" level
//!
//! Both parties draw their randomness from fixed SHAKE256 tapes, so every
//! message byte and the session key are reproducible. The values below were
//! computed by an independent model of the exchange.

use frodokex::kernel::Portable;
use frodokex::recommended::RecommendedParams;
use frodokex::{
    Backend, FrodoKex, Kernel, KeyExchange, RandomSource, new_key_exchange_with_backend,
};
use sha3::{
    Sha3_256, Shake256,
    digest::{Digest, ExtendableOutput, Update, XofReader},
};

const PARAM_SEED: [u8; 16] = [0x5a; 16];
const ALICE_TAPE: &[u8] = b"frodokex alice tape";
const BOB_TAPE: &[u8] = b"frodokex bob tape";

const SESSION_KEY: &str = "cba324e59f4110019b5056ca67a7ac297ff5c0d0c68f1104ca81b2aed08b0faf";
const ALICE_MSG_SHA3: &str = "a3d2522be44d114e2c1e40545dfb60dd6eb6db17473d462b314166c15a462e70";
const BOB_MSG_SHA3: &str = "1e43c96206e28ba122d26d540e7d04c37318f4d09f24e73ba95fb30b46333a64";
const BOB_HINT: &str = "811a04250cac990a";

/// Deterministic random tape: SHAKE256(label || 0x00)
struct Tape {
    reader: sha3::Shake256Reader,
}

impl Tape {
    fn new(label: &[u8]) -> Self {
        const TAPE_DOMAIN: u8 = 0;
        let mut hasher = Shake256::default();
        hasher.update(label);
        hasher.update(&[TAPE_DOMAIN]);
        Self {
            reader: hasher.finalize_xof(),
        }
    }
}

impl RandomSource for Tape {
    fn fill(&mut self, buf: &mut [u8]) -> frodokex::Result<()> {
        self.reader.read(buf);
        Ok(())
    }
}

fn sha3_hex(bytes: &[u8]) -> String {
    hex::encode(Sha3_256::digest(bytes))
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn run_static<K: Kernel>() {
    let kex = FrodoKex::<RecommendedParams, K>::new(&PARAM_SEED).unwrap();

    let (secret, alice_msg) = kex.alice_0(&mut Tape::new(ALICE_TAPE)).unwrap();
    assert_eq!(alice_msg.len(), 11296);
    assert_eq!(&alice_msg[..16], &PARAM_SEED);
    assert_eq!(sha3_hex(&alice_msg), ALICE_MSG_SHA3, "alice message, {:?}", K::BACKEND);

    let (bob_msg, bob_key) = kex.bob(&mut Tape::new(BOB_TAPE), &alice_msg).unwrap();
    assert_eq!(bob_msg.len(), 11288);
    assert_eq!(hex::encode(&bob_msg[11280..]), BOB_HINT);
    assert_eq!(sha3_hex(&bob_msg), BOB_MSG_SHA3, "bob message, {:?}", K::BACKEND);
    assert_eq!(hex::encode(bob_key.as_bytes()), SESSION_KEY, "bob key, {:?}", K::BACKEND);

    let alice_key = kex.alice_1(secret, &bob_msg).unwrap();
    assert_eq!(hex::encode(alice_key.as_bytes()), SESSION_KEY, "alice key, {:?}", K::BACKEND);
}

#[test]
fn recommended_vector_portable() {
    init_tracing();
    run_static::<Portable>();
}

#[cfg(feature = "simd")]
#[test]
fn recommended_vector_wide() {
    init_tracing();
    run_static::<frodokex::kernel::Wide>();
}

#[test]
fn recommended_vector_through_trait_object() {
    init_tracing();
    let kex = new_key_exchange_with_backend("recommended", &PARAM_SEED, Backend::detect()).unwrap();

    let (secret, alice_msg) = kex.alice_0(&mut Tape::new(ALICE_TAPE)).unwrap();
    let (bob_msg, bob_key) = kex.bob(&mut Tape::new(BOB_TAPE), &alice_msg).unwrap();
    let alice_key = kex.alice_1(secret, &bob_msg).unwrap();

    assert_eq!(sha3_hex(&alice_msg), ALICE_MSG_SHA3);
    assert_eq!(sha3_hex(&bob_msg), BOB_MSG_SHA3);
    assert_eq!(hex::encode(alice_key.as_bytes()), SESSION_KEY);
    assert_eq!(alice_key, bob_key);
}

#[test]
fn truncated_vector_messages_are_rejected() {
    let kex = new_key_exchange_with_backend("recommended", &PARAM_SEED, Backend::Portable).unwrap();
    let (secret, alice_msg) = kex.alice_0(&mut Tape::new(ALICE_TAPE)).unwrap();
    assert!(matches!(
        kex.bob(&mut Tape::new(BOB_TAPE), &alice_msg[..alice_msg.len() - 1]),
        Err(frodokex::Error::MalformedMessage { .. })
    ));

    let (bob_msg, _) = kex.bob(&mut Tape::new(BOB_TAPE), &alice_msg).unwrap();
    assert!(matches!(
        kex.alice_1(secret, &bob_msg[..bob_msg.len() - 1]),
        Err(frodokex::Error::MalformedMessage { .. })
    ));
}
