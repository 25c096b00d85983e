//! Secret and public keys over BLS12-381.
//!
//! Secret keys are 32-byte scalars, never zero. Public keys are 48-byte
//! compressed G1 points, validated (subgroup membership and non-infinity) at
//! every construction path. Both round-trip through fixed-length big-endian
//! encodings and `0x`-prefixed lowercase hex.

use crate::{
    cache::PublicKeyCache, signature::Signature, Error, HEX_PREFIX, MESSAGE_DST,
    PROOF_OF_POSSESSION_DST, PUBLIC_KEY_HEX_LENGTH, PUBLIC_KEY_LENGTH, SECRET_KEY_LENGTH,
};
use blst::{min_pk, BLST_ERROR};
use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};
use std::fmt;
use zeroize::Zeroize;

/// A BLS12-381 secret key.
///
/// The inner scalar is wiped from memory when the key is dropped.
#[derive(Clone)]
pub struct SecretKey(min_pk::SecretKey);

impl SecretKey {
    /// Generates a new secret key from 32 bytes of secure randomness.
    ///
    /// The randomness is expanded through the standard key-generation function
    /// (RFC 9380 `KeyGen`), never used as a raw scalar.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self, Error> {
        let mut ikm = [0u8; SECRET_KEY_LENGTH];
        rng.fill_bytes(&mut ikm);
        let secret = Self::expand(&ikm);
        ikm.zeroize();
        secret
    }

    /// Derives a secret key deterministically from other key material.
    ///
    /// The material is left-padded to 32 bytes and expanded through the same
    /// key-generation function as [`SecretKey::generate`], so identical input
    /// reproducibly yields the same BLS identity across processes. This is how
    /// a validator derives its consensus key from its node key.
    pub fn from_key_material(material: &[u8]) -> Result<Self, Error> {
        if material.len() >= SECRET_KEY_LENGTH {
            return Self::expand(material);
        }
        let mut ikm = [0u8; SECRET_KEY_LENGTH];
        ikm[SECRET_KEY_LENGTH - material.len()..].copy_from_slice(material);
        let secret = Self::expand(&ikm);
        ikm.zeroize();
        secret
    }

    /// Deserializes a secret key from its 32-byte big-endian encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != SECRET_KEY_LENGTH {
            return Err(Error::InvalidSecretKeyLength);
        }
        if bytes.iter().all(|b| *b == 0) {
            return Err(Error::ZeroSecretKey);
        }
        let secret = min_pk::SecretKey::from_bytes(bytes).map_err(|_| Error::InvalidSecretKey)?;
        Ok(Self(secret))
    }

    /// Parses a secret key from a base-10 string.
    ///
    /// The value must have an exact 32-byte big-endian representation;
    /// anything shorter or longer is rejected rather than padded.
    pub fn from_big_num(decimal: &str) -> Result<Self, Error> {
        let value =
            BigUint::parse_bytes(decimal.as_bytes(), 10).ok_or(Error::InvalidSecretKey)?;
        if value.bits() == 0 {
            return Err(Error::ZeroSecretKey);
        }
        let bytes = value.to_bytes_be();
        if bytes.len() != SECRET_KEY_LENGTH {
            return Err(Error::InvalidSecretKeyLength);
        }
        Self::from_bytes(&bytes)
    }

    /// Returns the public key corresponding to this secret key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.sk_to_pk())
    }

    /// Signs the provided message.
    ///
    /// Signatures are deterministic per (key, message) and bound to
    /// [`MESSAGE_DST`](crate::MESSAGE_DST), so they cannot be replayed across
    /// protocols.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.0.sign(message, MESSAGE_DST, &[]))
    }

    /// Signs a registration payload under the proof-of-possession tag.
    ///
    /// The payload should bind this key's public key to the registering
    /// identity (the verifier recomputes it the same way).
    pub fn sign_proof_of_possession(&self, payload: &[u8]) -> Signature {
        Signature(self.0.sign(payload, PROOF_OF_POSSESSION_DST, &[]))
    }

    /// Serializes the secret key into its 32-byte big-endian encoding.
    pub fn to_bytes(&self) -> [u8; SECRET_KEY_LENGTH] {
        self.0.to_bytes()
    }

    /// Returns the `0x`-prefixed lowercase hex encoding of the secret key.
    pub fn to_hex(&self) -> String {
        format!("{}{}", HEX_PREFIX, hex::encode(self.to_bytes()))
    }

    /// Expands input key material into a secret key, rejecting degenerate
    /// results.
    fn expand(ikm: &[u8]) -> Result<Self, Error> {
        let secret = min_pk::SecretKey::key_gen(ikm, &[]).map_err(|_| Error::InvalidSecretKey)?;
        if secret.to_bytes() == [0u8; SECRET_KEY_LENGTH] {
            return Err(Error::ZeroSecretKey);
        }
        Ok(Self(secret))
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey([REDACTED])")
    }
}

/// A validated BLS12-381 public key.
///
/// Every value of this type has passed the subgroup and non-infinity checks.
/// `Copy` semantics mean every handed-out key is an independent copy, so
/// concurrent holders never alias shared state.
#[derive(Clone, Copy)]
pub struct PublicKey(pub(crate) min_pk::PublicKey);

impl PublicKey {
    /// Deserializes and validates a public key from its 48-byte compressed
    /// encoding.
    ///
    /// The identity element is rejected with [`Error::InfinitePublicKey`],
    /// distinct from the general decode failure: an "infinite" key would let
    /// a signer vacuously satisfy any verification.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != PUBLIC_KEY_LENGTH {
            return Err(Error::InvalidPublicKeyLength);
        }
        let key = min_pk::PublicKey::uncompress(bytes).map_err(|_| Error::InvalidPublicKey)?;
        match key.validate() {
            Ok(()) => Ok(Self(key)),
            Err(BLST_ERROR::BLST_PK_IS_INFINITY) => Err(Error::InfinitePublicKey),
            Err(_) => Err(Error::InvalidPublicKey),
        }
    }

    /// Parses a public key from its `0x`-prefixed hex string.
    ///
    /// The string must be exactly 98 characters: the prefix plus 96 hex
    /// digits.
    pub fn from_hex(encoded: &str) -> Result<Self, Error> {
        if encoded.len() != PUBLIC_KEY_HEX_LENGTH {
            return Err(Error::InvalidPublicKeyLength);
        }
        let stripped = encoded
            .strip_prefix(HEX_PREFIX)
            .ok_or(Error::InvalidPublicKey)?;
        let bytes = hex::decode(stripped).map_err(|_| Error::InvalidPublicKey)?;
        Self::from_bytes(&bytes)
    }

    /// Serializes the public key into its 48-byte compressed encoding.
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.0.compress()
    }

    /// Returns the `0x`-prefixed lowercase hex encoding of the public key.
    pub fn to_hex(&self) -> String {
        format!("{}{}", HEX_PREFIX, hex::encode(self.to_bytes()))
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq(&other.0)
    }
}

impl Eq for PublicKey {}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

/// Aggregates already-validated public keys into a single key.
///
/// Point addition is commutative and associative, so the input order does not
/// matter. Fails on an empty set: there is no meaningful identity to return
/// (the identity element is not a valid public key).
pub fn aggregate_public_keys(public_keys: &[PublicKey]) -> Result<PublicKey, Error> {
    if public_keys.is_empty() {
        return Err(Error::EmptyAggregate);
    }
    let refs: Vec<&min_pk::PublicKey> = public_keys.iter().map(|pk| &pk.0).collect();
    // No group check needed here since every PublicKey was validated at
    // construction.
    let aggregate = min_pk::AggregatePublicKey::aggregate(&refs, false)
        .map_err(|_| Error::InvalidPublicKey)?;
    Ok(PublicKey(aggregate.to_public_key()))
}

/// Validates every raw key through the cache, then aggregates them.
///
/// The first key that fails validation aborts the whole aggregation with its
/// error.
pub fn aggregate_raw_public_keys<B: AsRef<[u8]>>(
    cache: &PublicKeyCache,
    raw: &[B],
) -> Result<PublicKey, Error> {
    if raw.is_empty() {
        return Err(Error::EmptyAggregate);
    }
    let mut public_keys = Vec::with_capacity(raw.len());
    for bytes in raw {
        public_keys.push(cache.decode(bytes.as_ref())?);
    }
    aggregate_public_keys(&public_keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::OsRng, thread_rng, Rng};

    /// Compressed encoding of the G1 identity element.
    fn infinite_public_key() -> [u8; PUBLIC_KEY_LENGTH] {
        let mut bytes = [0u8; PUBLIC_KEY_LENGTH];
        bytes[0] = 0xc0;
        bytes
    }

    #[test]
    fn test_public_key_from_bytes() {
        let valid: [u8; PUBLIC_KEY_LENGTH] = [
            0xa9, 0x9a, 0x76, 0xed, 0x77, 0x96, 0xf7, 0xbe, 0x22, 0xd5, 0xb7, 0xe8, 0x5d, 0xee,
            0xb7, 0xc5, 0x67, 0x7e, 0x88, 0xe5, 0x11, 0xe0, 0xb3, 0x37, 0x61, 0x8f, 0x8c, 0x4e,
            0xb6, 0x13, 0x49, 0xb4, 0xbf, 0x2d, 0x15, 0x3f, 0x64, 0x9f, 0x7b, 0x53, 0x35, 0x9f,
            0xe8, 0xb9, 0x4a, 0x38, 0xe4, 0x4c,
        ];
        let cases: Vec<(&str, Vec<u8>, Option<Error>)> = vec![
            ("empty", vec![], Some(Error::InvalidPublicKeyLength)),
            (
                "short",
                vec![0u8; PUBLIC_KEY_LENGTH - 1],
                Some(Error::InvalidPublicKeyLength),
            ),
            (
                "long",
                vec![0u8; PUBLIC_KEY_LENGTH + 1],
                Some(Error::InvalidPublicKeyLength),
            ),
            (
                "garbage",
                vec![0u8; PUBLIC_KEY_LENGTH],
                Some(Error::InvalidPublicKey),
            ),
            ("good", valid.to_vec(), None),
        ];
        for (name, input, expected) in cases {
            let result = PublicKey::from_bytes(&input);
            match expected {
                Some(err) => assert_eq!(result.unwrap_err(), err, "case {name}"),
                None => assert_eq!(result.unwrap().to_bytes().to_vec(), input, "case {name}"),
            }
        }
    }

    #[test]
    fn test_infinite_public_key_rejected() {
        assert_eq!(
            PublicKey::from_bytes(&infinite_public_key()).unwrap_err(),
            Error::InfinitePublicKey
        );
    }

    #[test]
    fn test_zero_secret_key_rejected() {
        assert_eq!(
            SecretKey::from_bytes(&[0u8; SECRET_KEY_LENGTH]).unwrap_err(),
            Error::ZeroSecretKey
        );
    }

    #[test]
    fn test_secret_key_lengths_rejected() {
        assert_eq!(
            SecretKey::from_bytes(&[1u8; SECRET_KEY_LENGTH - 1]).unwrap_err(),
            Error::InvalidSecretKeyLength
        );
        assert_eq!(
            SecretKey::from_bytes(&[1u8; SECRET_KEY_LENGTH + 1]).unwrap_err(),
            Error::InvalidSecretKeyLength
        );
    }

    #[test]
    fn test_secret_key_roundtrip() {
        let secret = SecretKey::generate(&mut OsRng).unwrap();
        let decoded = SecretKey::from_bytes(&secret.to_bytes()).unwrap();
        assert_eq!(secret.to_bytes(), decoded.to_bytes());
        assert_eq!(secret.public_key(), decoded.public_key());

        let encoded = secret.to_hex();
        assert_eq!(encoded.len(), 2 + 2 * SECRET_KEY_LENGTH);
        let bytes = hex::decode(&encoded[2..]).unwrap();
        assert_eq!(SecretKey::from_bytes(&bytes).unwrap().to_bytes(), secret.to_bytes());
    }

    #[test]
    fn test_public_key_roundtrip() {
        let secret = SecretKey::generate(&mut OsRng).unwrap();
        let public = secret.public_key();
        let decoded = PublicKey::from_bytes(&public.to_bytes()).unwrap();
        assert_eq!(public, decoded);

        // The decoded key verifies as the same key.
        let msg = b"hello";
        let sig = secret.sign(msg);
        assert!(sig.verify(&decoded, msg));
    }

    #[test]
    fn test_public_key_hex() {
        let secret = SecretKey::generate(&mut OsRng).unwrap();
        let public = secret.public_key();
        let encoded = public.to_hex();
        assert_eq!(encoded.len(), PUBLIC_KEY_HEX_LENGTH);
        assert!(encoded.starts_with(HEX_PREFIX));
        assert_eq!(PublicKey::from_hex(&encoded).unwrap(), public);

        assert_eq!(
            PublicKey::from_hex(&encoded[2..]).unwrap_err(),
            Error::InvalidPublicKeyLength
        );
    }

    #[test]
    fn test_from_key_material_deterministic() {
        let mut material = [0u8; SECRET_KEY_LENGTH];
        thread_rng().fill(&mut material);

        let first = SecretKey::from_key_material(&material).unwrap();
        for _ in 0..100 {
            let again = SecretKey::from_key_material(&material).unwrap();
            assert_eq!(first.to_bytes(), again.to_bytes());
        }

        // Derivation expands the material, it never uses it as a raw scalar.
        assert_ne!(first.to_bytes(), material);
    }

    #[test]
    fn test_from_key_material_pads_short_input() {
        let short = [7u8; 20];
        let mut padded = [0u8; SECRET_KEY_LENGTH];
        padded[SECRET_KEY_LENGTH - short.len()..].copy_from_slice(&short);

        let from_short = SecretKey::from_key_material(&short).unwrap();
        let from_padded = SecretKey::from_key_material(&padded).unwrap();
        assert_eq!(from_short.to_bytes(), from_padded.to_bytes());
    }

    #[test]
    fn test_from_big_num() {
        // Zero is degenerate.
        assert_eq!(
            SecretKey::from_big_num("0").unwrap_err(),
            Error::ZeroSecretKey
        );

        // A value wider than 32 bytes is rejected.
        let mut wide = [0u8; 40];
        thread_rng().fill(&mut wide[..]);
        wide[0] |= 0x01;
        let wide = BigUint::from_bytes_be(&wide);
        assert_eq!(
            SecretKey::from_big_num(&wide.to_string()).unwrap_err(),
            Error::InvalidSecretKeyLength
        );

        // Not a number at all.
        assert!(SecretKey::from_big_num("not a number").is_err());

        // A generated key round-trips through its decimal form when its
        // top byte is non-zero (the representation must be exactly 32 bytes).
        loop {
            let secret = SecretKey::generate(&mut OsRng).unwrap();
            let bytes = secret.to_bytes();
            if bytes[0] == 0 {
                continue;
            }
            let decimal = BigUint::from_bytes_be(&bytes).to_string();
            let decoded = SecretKey::from_big_num(&decimal).unwrap();
            assert_eq!(secret.to_bytes(), decoded.to_bytes());
            break;
        }
    }

    #[test]
    fn test_aggregate_public_keys_empty() {
        assert_eq!(
            aggregate_public_keys(&[]).unwrap_err(),
            Error::EmptyAggregate
        );
    }

    #[test]
    fn test_aggregate_public_keys_commutative() {
        let keys: Vec<PublicKey> = (0..3)
            .map(|_| SecretKey::generate(&mut OsRng).unwrap().public_key())
            .collect();
        let reversed: Vec<PublicKey> = keys.iter().rev().copied().collect();

        let forward = aggregate_public_keys(&keys).unwrap();
        let backward = aggregate_public_keys(&reversed).unwrap();
        assert_eq!(forward, backward);

        // Aggregation leaves the inputs untouched.
        let secret = SecretKey::generate(&mut OsRng).unwrap();
        let public = secret.public_key();
        let before = public.to_bytes();
        aggregate_public_keys(&[public, keys[0]]).unwrap();
        assert_eq!(public.to_bytes(), before);
    }

    #[test]
    fn test_aggregate_raw_public_keys() {
        let cache = PublicKeyCache::default();
        let keys: Vec<PublicKey> = (0..4)
            .map(|_| SecretKey::generate(&mut OsRng).unwrap().public_key())
            .collect();
        let raw: Vec<[u8; PUBLIC_KEY_LENGTH]> = keys.iter().map(|pk| pk.to_bytes()).collect();

        let from_raw = aggregate_raw_public_keys(&cache, &raw).unwrap();
        let from_parsed = aggregate_public_keys(&keys).unwrap();
        assert_eq!(from_raw, from_parsed);

        let empty: Vec<[u8; PUBLIC_KEY_LENGTH]> = Vec::new();
        assert_eq!(
            aggregate_raw_public_keys(&cache, &empty).unwrap_err(),
            Error::EmptyAggregate
        );
    }

    #[test]
    fn test_aggregate_raw_public_keys_rejects_infinite() {
        let cache = PublicKeyCache::default();
        assert_eq!(
            aggregate_raw_public_keys(&cache, &[infinite_public_key(), infinite_public_key()])
                .unwrap_err(),
            Error::InfinitePublicKey
        );

        // A single bad key anywhere in the set surfaces its error.
        let good = SecretKey::generate(&mut OsRng).unwrap().public_key();
        assert_eq!(
            aggregate_raw_public_keys(&cache, &[good.to_bytes(), infinite_public_key()])
                .unwrap_err(),
            Error::InfinitePublicKey
        );
    }

    #[test]
    fn test_secret_key_debug_redacted() {
        let secret = SecretKey::generate(&mut OsRng).unwrap();
        assert_eq!(format!("{:?}", secret), "SecretKey([REDACTED])");
    }
}
