//! Canonical encoding of a record for hashing.
//!
//! Layout (frozen, changes break every existing chain):
//!
//! ```text
//! "votechain/record/v1" || CBOR array(5) [
//!     text  voterIdMasked,
//!     text  candidate,
//!     text  salt,
//!     int   timestamp,
//!     text  prevHash,
//! ]
//! ```
//!
//! - Field order is fixed; the array is positional, there are no map keys.
//! - Every text item carries its byte length, so adjacent fields cannot merge.
//! - Integers and lengths use the shortest CBOR head (RFC 8949 core
//!   deterministic encoding), definite lengths only.
//! - The `hash` field is never part of the encoding.
//!
//! The bytes are produced by hand rather than by a serializer so the digest
//! input does not depend on any library's default behaviour.

use ciborium::value::Value;

use crate::error::CoreError;
use crate::record::{Record, VotePayload};

/// Domain separation prefix for record digests.
pub const RECORD_DOMAIN: &[u8] = b"votechain/record/v1";

/// Number of items in the canonical array.
const FIELD_COUNT: u64 = 5;

/// CBOR major types used by the layout.
mod major {
    pub const UNSIGNED: u8 = 0;
    pub const NEGATIVE: u8 = 1;
    pub const TEXT: u8 = 3;
    pub const ARRAY: u8 = 4;
}

/// Encode a payload and its predecessor link to canonical bytes.
pub fn canonicalize(payload: &VotePayload, prev_hash: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(
        RECORD_DOMAIN.len()
            + 16
            + payload.voter_id_masked.len()
            + payload.candidate.len()
            + payload.salt.len()
            + prev_hash.len(),
    );
    buf.extend_from_slice(RECORD_DOMAIN);
    encode_uint(&mut buf, major::ARRAY, FIELD_COUNT);
    encode_text(&mut buf, &payload.voter_id_masked);
    encode_text(&mut buf, &payload.candidate);
    encode_text(&mut buf, &payload.salt);
    encode_int(&mut buf, payload.timestamp);
    encode_text(&mut buf, prev_hash);
    buf
}

/// Canonical bytes of a stored record (its `hash` field is ignored).
pub fn canonical_bytes(record: &Record) -> Vec<u8> {
    canonicalize(&record.payload(), &record.prev_hash)
}

/// Decode canonical bytes back into a payload and its prev_hash.
///
/// Used by tooling that inspects digest inputs; the chain itself never
/// needs to decode.
pub fn decode_canonical(bytes: &[u8]) -> Result<(VotePayload, String), CoreError> {
    let body = bytes
        .strip_prefix(RECORD_DOMAIN)
        .ok_or_else(|| CoreError::MalformedRecord("missing domain prefix".into()))?;

    let value: Value =
        ciborium::from_reader(body).map_err(|e| CoreError::DecodingError(e.to_string()))?;

    let items = match value {
        Value::Array(items) if items.len() == FIELD_COUNT as usize => items,
        _ => return Err(CoreError::MalformedRecord("expected 5-item array".into())),
    };

    let text = |idx: usize, name: &str| -> Result<String, CoreError> {
        match &items[idx] {
            Value::Text(s) => Ok(s.clone()),
            _ => Err(CoreError::MalformedRecord(format!("invalid {}", name))),
        }
    };

    let timestamp = match &items[3] {
        Value::Integer(i) => {
            let n: i128 = (*i).into();
            i64::try_from(n)
                .map_err(|_| CoreError::MalformedRecord("timestamp out of range".into()))?
        }
        _ => return Err(CoreError::MalformedRecord("invalid timestamp".into())),
    };

    let payload = VotePayload {
        voter_id_masked: text(0, "voterIdMasked")?,
        candidate: text(1, "candidate")?,
        salt: text(2, "salt")?,
        timestamp,
    };
    let prev_hash = text(4, "prevHash")?;

    Ok((payload, prev_hash))
}

/// Encode a signed integer (major types 0 and 1).
fn encode_int(buf: &mut Vec<u8>, n: i64) {
    if n >= 0 {
        encode_uint(buf, major::UNSIGNED, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        encode_uint(buf, major::NEGATIVE, (-1 - n) as u64);
    }
}

/// Encode an unsigned integer head with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a text string (major type 3).
fn encode_text(buf: &mut Vec<u8>, s: &str) {
    encode_uint(buf, major::TEXT, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}
