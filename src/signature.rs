//! Signatures, verification, and aggregation.
//!
//! Signatures are 96-byte compressed G2 points. Decompression performs the
//! subgroup check but not an infinity check: a legitimate aggregate of many
//! signatures could (astronomically rarely) sum to the identity, so rejecting
//! it would reject a valid certificate.
//!
//! Verification assumes its operands were validated when they crossed the
//! byte boundary ([`PublicKey::from_bytes`](crate::PublicKey::from_bytes) and
//! [`Signature::from_bytes`]) and skips revalidation.

use crate::{
    keys::PublicKey, Error, Message, HEX_PREFIX, MESSAGE_DST, PROOF_OF_POSSESSION_DST,
    SIGNATURE_LENGTH,
};
use blst::{min_pk, BLST_ERROR};
use std::collections::HashSet;
use std::fmt;

/// Compressed encoding of the G2 identity element.
const INFINITY: [u8; SIGNATURE_LENGTH] = [
    0xc0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0,
];

/// A BLS12-381 signature, either an individual signature or an aggregate.
#[derive(Clone, Copy)]
pub struct Signature(pub(crate) min_pk::Signature);

impl Signature {
    /// Deserializes a signature from its 96-byte compressed encoding.
    ///
    /// Performs the subgroup check. Does not reject the identity element,
    /// since an aggregated signature could legitimately be infinite.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(Error::InvalidSignatureLength);
        }
        let signature =
            min_pk::Signature::uncompress(bytes).map_err(|_| Error::InvalidSignature)?;
        signature
            .validate(false)
            .map_err(|_| Error::InvalidSignature)?;
        Ok(Self(signature))
    }

    /// The additive identity of G2.
    ///
    /// Callers that fold signatures incrementally start from this element;
    /// aggregating it into anything is the identity function.
    pub fn infinity() -> Self {
        Self(
            min_pk::Signature::uncompress(&INFINITY)
                .expect("the infinity encoding is a valid compressed point"),
        )
    }

    /// Folds another signature into this one, returning the aggregate.
    pub fn aggregate(&self, other: &Signature) -> Signature {
        let mut aggregate = min_pk::AggregateSignature::from_signature(&self.0);
        aggregate
            .add_signature(&other.0, false)
            .expect("aggregation without group checks cannot fail");
        Signature(aggregate.to_signature())
    }

    /// Verifies this signature over a message under a single public key.
    ///
    /// One pairing check. Both operands are assumed to have been validated at
    /// decompression time.
    pub fn verify(&self, public_key: &PublicKey, message: &[u8]) -> bool {
        let result = self
            .0
            .verify(false, message, MESSAGE_DST, &[], &public_key.0, false);
        result == BLST_ERROR::BLST_SUCCESS
    }

    /// Verifies this signature as an aggregate over N distinct
    /// (public key, message) pairs.
    ///
    /// Empty or length-mismatched inputs verify as `false`. Message
    /// distinctness is an enforced precondition: a batch containing a repeated
    /// message verifies as `false`, because the underlying check is not sound
    /// against crafted signatures when messages repeat across signers. Bind
    /// each message to its round/height/signer to keep them distinct.
    pub fn aggregate_verify(&self, public_keys: &[PublicKey], messages: &[Message]) -> bool {
        if public_keys.is_empty() || public_keys.len() != messages.len() {
            return false;
        }
        let mut seen = HashSet::with_capacity(messages.len());
        if !messages.iter().all(|message| seen.insert(message)) {
            return false;
        }
        let message_refs: Vec<&[u8]> = messages.iter().map(|m| m.as_slice()).collect();
        let key_refs: Vec<&min_pk::PublicKey> = public_keys.iter().map(|pk| &pk.0).collect();
        let result =
            self.0
                .aggregate_verify(false, &message_refs, MESSAGE_DST, &key_refs, false);
        result == BLST_ERROR::BLST_SUCCESS
    }

    /// Verifies this signature as an aggregate of N signatures over one shared
    /// message.
    ///
    /// Faster than [`Signature::aggregate_verify`]: the public keys are
    /// summed before a single pairing check. An empty key list returns
    /// `false`, not a vacuous `true`.
    pub fn fast_aggregate_verify(&self, public_keys: &[PublicKey], message: &Message) -> bool {
        if public_keys.is_empty() {
            return false;
        }
        let key_refs: Vec<&min_pk::PublicKey> = public_keys.iter().map(|pk| &pk.0).collect();
        let result = self
            .0
            .fast_aggregate_verify(true, message.as_slice(), MESSAGE_DST, &key_refs);
        result == BLST_ERROR::BLST_SUCCESS
    }

    /// Verifies this signature as a proof of possession over the registration
    /// payload.
    pub fn verify_proof_of_possession(&self, public_key: &PublicKey, payload: &[u8]) -> bool {
        let result = self.0.verify(
            false,
            payload,
            PROOF_OF_POSSESSION_DST,
            &[],
            &public_key.0,
            false,
        );
        result == BLST_ERROR::BLST_SUCCESS
    }

    /// Serializes the signature into its 96-byte compressed encoding.
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        self.0.compress()
    }

    /// Returns the `0x`-prefixed lowercase hex encoding of the signature.
    pub fn to_hex(&self) -> String {
        format!("{}{}", HEX_PREFIX, hex::encode(self.to_bytes()))
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq(&other.0)
    }
}

impl Eq for Signature {}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self.to_hex())
    }
}

/// Aggregates signatures into a single signature by point addition.
///
/// Pure and order-independent. Returns `None` for an empty list.
pub fn aggregate_signatures(signatures: &[Signature]) -> Option<Signature> {
    if signatures.is_empty() {
        return None;
    }
    let refs: Vec<&min_pk::Signature> = signatures.iter().map(|s| &s.0).collect();
    // Inputs were group-checked at decompression time.
    let aggregate = min_pk::AggregateSignature::aggregate(&refs, false)
        .expect("aggregation over a non-empty set without group checks cannot fail");
    Some(Signature(aggregate.to_signature()))
}
