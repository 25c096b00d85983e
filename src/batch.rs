//! Randomized batch verification of unrelated signatures.
//!
//! Verifies `n` independent (signature, key, message) triples in one
//! multi-pairing. Each entry is weighted by a fresh random scalar
//! (`S* = Σ r_i·S_i`, checked against `Π e(r_i·P_i, M_i)`), so an attacker
//! who wants a crafted batch to pass while containing an individually-invalid
//! signature has to predict scalars drawn after the batch was fixed. Without
//! the weights, rogue public keys chosen as a function of other entries' keys
//! can cancel each other out.

use crate::{keys::PublicKey, Error, Message, MESSAGE_DST, SIGNATURE_LENGTH};
use blst::{blst_scalar, blst_scalar_from_uint64, min_pk, BLST_ERROR};
use rand::{CryptoRng, RngCore};
use std::sync::Mutex;
use tracing::debug;

/// Bits of entropy in each per-entry scalar. Bounds the forgery probability
/// of a single batch at 2^-64.
const RAND_BITS: usize = 64;

/// Verifies a set of raw signatures against their public keys and messages.
///
/// Returns one boolean for the whole batch; it does not localize failures
/// (the locator does). An empty batch verifies as `false`. Mismatched input
/// lengths are a precondition violation and return an error before any
/// verification begins.
///
/// Signatures are group-checked as part of the multi-pairing since they are
/// decompressed here; public keys are assumed to have been validated at
/// decode time. The shared RNG handle is the only lock in the subsystem, and
/// each per-entry draw holds it for exactly one scalar.
pub fn verify_multiple_signatures<B, R>(
    signatures: &[B],
    messages: &[Message],
    public_keys: &[PublicKey],
    rng: &Mutex<R>,
) -> Result<bool, Error>
where
    B: AsRef<[u8]>,
    R: RngCore + CryptoRng,
{
    if signatures.is_empty() || public_keys.is_empty() {
        return Ok(false);
    }
    let length = signatures.len();
    if length != public_keys.len() || length != messages.len() {
        return Err(Error::LengthMismatch {
            signatures: length,
            public_keys: public_keys.len(),
            messages: messages.len(),
        });
    }

    // Decompress the whole batch up front. A signature that does not decode
    // can never verify, so the batch is simply invalid.
    let mut decoded = Vec::with_capacity(length);
    for (index, raw) in signatures.iter().enumerate() {
        let raw = raw.as_ref();
        if raw.len() != SIGNATURE_LENGTH {
            return Ok(false);
        }
        match min_pk::Signature::uncompress(raw) {
            Ok(signature) => decoded.push(signature),
            Err(_) => {
                debug!(index, "batch contains an undecodable signature");
                return Ok(false);
            }
        }
    }

    // One fresh, independent, non-zero scalar per entry. The draws are
    // serialized on the shared RNG handle.
    let mut rands = Vec::with_capacity(length);
    for _ in 0..length {
        let mut value = [0u64; 4];
        {
            let mut rng = rng.lock().expect("rng lock poisoned");
            value[0] = rng.next_u64();
            while value[0] == 0 {
                value[0] = rng.next_u64();
            }
        }
        let mut scalar = blst_scalar::default();
        unsafe { blst_scalar_from_uint64(&mut scalar, value.as_ptr()) };
        rands.push(scalar);
    }

    let message_refs: Vec<&[u8]> = messages.iter().map(|m| m.as_slice()).collect();
    let key_refs: Vec<&min_pk::PublicKey> = public_keys.iter().map(|pk| &pk.0).collect();
    let signature_refs: Vec<&min_pk::Signature> = decoded.iter().collect();

    // Group-check the signatures here since this is where they were
    // decompressed; public keys were validated at decode time.
    let result = min_pk::Signature::verify_multiple_aggregate_signatures(
        &message_refs,
        MESSAGE_DST,
        &key_refs,
        false,
        &signature_refs,
        true,
        &rands,
        RAND_BITS,
    );
    Ok(result == BLST_ERROR::BLST_SUCCESS)
}
