//! Authenticate, aggregate, and audit BLS12-381 validator votes.
//!
//! This crate wraps the `blst` implementation of BLS12-381 (48-byte G1 public
//! keys, 96-byte G2 signatures) with the operations a BFT consensus engine
//! needs to build and check quorum certificates: key derivation (random and
//! deterministic from other key material), signing, verification, aggregation
//! of public keys and signatures, randomized batch verification that resists
//! rogue public-key forgery, and a concurrent divide-and-conquer locator that
//! returns exactly the invalid entries of a failing batch.
//!
//! All points are validated once, when they cross the byte boundary:
//! [`PublicKey::from_bytes`] performs the subgroup and non-infinity checks and
//! [`Signature::from_bytes`] performs the subgroup check, so the verification
//! paths can skip revalidation. Signatures may be the identity element since a
//! legitimate large aggregate could (astronomically rarely) sum to it.
//!
//! # Example
//!
//! ```rust
//! use quorum_bls::{aggregate_signatures, find_fast_invalid_signatures, Message, SecretKey};
//! use rand::rngs::OsRng;
//!
//! // Four validators vote on the same proposal digest.
//! let message: Message = [7u8; 32];
//! let signers: Vec<SecretKey> = (0..4)
//!     .map(|_| SecretKey::generate(&mut OsRng).expect("keygen should succeed"))
//!     .collect();
//! let public_keys: Vec<_> = signers.iter().map(|s| s.public_key()).collect();
//! let signatures: Vec<_> = signers.iter().map(|s| s.sign(&message)).collect();
//!
//! // Combine the votes into one certificate signature and verify it.
//! let certificate = aggregate_signatures(&signatures).expect("at least one signature");
//! assert!(certificate.fast_aggregate_verify(&public_keys, &message));
//!
//! // Diagnose the batch: no signer misbehaved.
//! let invalid = find_fast_invalid_signatures(&signatures, &public_keys, &message).unwrap();
//! assert!(invalid.is_empty());
//! ```

use thiserror::Error;

mod batch;
mod cache;
mod keys;
mod locator;
mod signature;

pub use batch::verify_multiple_signatures;
pub use cache::{PublicKeyCache, DEFAULT_CACHE_CAPACITY};
pub use keys::{aggregate_public_keys, aggregate_raw_public_keys, PublicKey, SecretKey};
pub use locator::{find_fast_invalid_signatures, find_invalid_signatures};
pub use signature::{aggregate_signatures, Signature};

/// Length of a serialized secret key (big-endian scalar).
pub const SECRET_KEY_LENGTH: usize = 32;

/// Length of a compressed G1 public key.
pub const PUBLIC_KEY_LENGTH: usize = 48;

/// Length of a compressed G2 signature.
pub const SIGNATURE_LENGTH: usize = 96;

/// Length of a `0x`-prefixed public key hex string.
pub const PUBLIC_KEY_HEX_LENGTH: usize = 2 + 2 * PUBLIC_KEY_LENGTH;

/// Domain separation tag for message signatures.
///
/// Must be identical between signer and verifier; changing it is a
/// deployment/versioning decision, not a per-call parameter.
pub const MESSAGE_DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_";

/// Domain separation tag for proofs of possession.
pub const PROOF_OF_POSSESSION_DST: &[u8] = b"BLS_POP_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_";

/// A 32-byte message digest, the unit all aggregate paths operate on.
pub type Message = [u8; 32];

pub(crate) const HEX_PREFIX: &str = "0x";

/// Errors that can occur when working with BLS12-381 keys and signatures.
///
/// Every failure is fatal to the in-flight operation: callers must reject the
/// offending vote or signer rather than fall back to another code path. Soft
/// outcomes (an invalid signature, an empty batch) are `bool` results, never
/// errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("secret key must be 32 bytes")]
    InvalidSecretKeyLength,
    #[error("public key must be 48 bytes")]
    InvalidPublicKeyLength,
    #[error("signature must be 96 bytes")]
    InvalidSignatureLength,
    #[error("secret key is the zero scalar")]
    ZeroSecretKey,
    #[error("could not decode bytes into a secret key")]
    InvalidSecretKey,
    #[error("could not decode bytes into a public key")]
    InvalidPublicKey,
    #[error("public key is the identity element")]
    InfinitePublicKey,
    #[error("signature is not in the G2 subgroup")]
    InvalidSignature,
    #[error("cannot aggregate an empty set of public keys")]
    EmptyAggregate,
    #[error("length mismatch: {signatures} signatures, {public_keys} public keys, {messages} messages")]
    LengthMismatch {
        signatures: usize,
        public_keys: usize,
        messages: usize,
    },
}
