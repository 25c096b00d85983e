//! Locates the invalid entries of a failing batch.
//!
//! A fully-valid sub-batch can be vouched for by one aggregate check, so the
//! locator recursively bisects the batch, aggregate-verifying each half and
//! descending only into halves that fail. Both halves of every split are
//! evaluated concurrently on the rayon pool and joined before the split
//! returns, so no task outlives its caller.
//!
//! Cost: a fully-valid batch takes O(log n) aggregate checks; a fully-invalid
//! batch degrades to O(n) individual checks plus O(log n) wasted aggregate
//! checks; `k` invalid entries scattered among `n` take O(k·log(n/k))
//! aggregate checks in expectation. This is why consensus fault-detection
//! uses it instead of scanning one signature at a time under adversarial
//! load.

use crate::{
    keys::PublicKey,
    signature::{aggregate_signatures, Signature},
    Error, Message,
};
use tracing::debug;

/// The messages a batch was signed over: one per entry, or one shared by all.
enum Batch<'a> {
    Distinct(&'a [Message]),
    Shared(&'a Message),
}

impl Batch<'_> {
    fn verify_one(&self, signature: &Signature, public_key: &PublicKey, index: usize) -> bool {
        match self {
            Batch::Distinct(messages) => signature.verify(public_key, &messages[index]),
            Batch::Shared(message) => signature.verify(public_key, message.as_slice()),
        }
    }

    fn verify_aggregate(
        &self,
        aggregate: &Signature,
        public_keys: &[PublicKey],
        start: usize,
        end: usize,
    ) -> bool {
        match self {
            Batch::Distinct(messages) => {
                aggregate.aggregate_verify(&public_keys[start..end], &messages[start..end])
            }
            Batch::Shared(message) => {
                aggregate.fast_aggregate_verify(&public_keys[start..end], message)
            }
        }
    }
}

/// Returns exactly the indices whose (signature, key, message) triple fails
/// standalone verification, in ascending order.
///
/// Messages may differ per entry; each sub-batch is checked with
/// [`Signature::aggregate_verify`]. Mismatched input lengths fail before any
/// verification begins. An empty batch returns an empty set.
pub fn find_invalid_signatures(
    signatures: &[Signature],
    public_keys: &[PublicKey],
    messages: &[Message],
) -> Result<Vec<usize>, Error> {
    let length = signatures.len();
    if length != public_keys.len() || length != messages.len() {
        return Err(Error::LengthMismatch {
            signatures: length,
            public_keys: public_keys.len(),
            messages: messages.len(),
        });
    }
    if length == 0 {
        return Ok(Vec::new());
    }
    bisect(
        signatures,
        public_keys,
        &Batch::Distinct(messages),
        0,
        length,
    )
}

/// [`find_invalid_signatures`] for a batch signed over one shared message,
/// using the cheaper [`Signature::fast_aggregate_verify`] for sub-batches.
pub fn find_fast_invalid_signatures(
    signatures: &[Signature],
    public_keys: &[PublicKey],
    message: &Message,
) -> Result<Vec<usize>, Error> {
    let length = signatures.len();
    if length != public_keys.len() {
        return Err(Error::LengthMismatch {
            signatures: length,
            public_keys: public_keys.len(),
            messages: length,
        });
    }
    if length == 0 {
        return Ok(Vec::new());
    }
    bisect(signatures, public_keys, &Batch::Shared(message), 0, length)
}

fn bisect(
    signatures: &[Signature],
    public_keys: &[PublicKey],
    batch: &Batch,
    start: usize,
    end: usize,
) -> Result<Vec<usize>, Error> {
    // With two elements or fewer, splitting cannot save a verification.
    if end - start <= 2 {
        let mut invalid = Vec::new();
        for index in start..end {
            if !batch.verify_one(&signatures[index], &public_keys[index], index) {
                invalid.push(index);
            }
        }
        return Ok(invalid);
    }

    let pivot = start + (end - start) / 2;
    let (left, right) = rayon::join(
        || check_range(signatures, public_keys, batch, start, pivot),
        || check_range(signatures, public_keys, batch, pivot, end),
    );

    // Both halves have joined; the left branch's error wins when both fail.
    let mut invalid = left?;
    invalid.extend(right?);
    Ok(invalid)
}

fn check_range(
    signatures: &[Signature],
    public_keys: &[PublicKey],
    batch: &Batch,
    start: usize,
    end: usize,
) -> Result<Vec<usize>, Error> {
    let aggregate =
        aggregate_signatures(&signatures[start..end]).ok_or(Error::EmptyAggregate)?;
    if batch.verify_aggregate(&aggregate, public_keys, start, end) {
        return Ok(Vec::new());
    }
    debug!(start, end, "aggregate check failed, bisecting");
    bisect(signatures, public_keys, batch, start, end)
}
