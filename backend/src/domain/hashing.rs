//! # Tamper-evidence hashing
//!
//! A certificate carries a SHA-256 digest of the record it was printed from,
//! both as visible text and inside its verification link. A verifier reloads
//! the record, recomputes the digest, and compares.
//!
//! This is tamper *evidence*, not tamper *proof*. The digest is unkeyed and
//! the algorithm is public, so anyone who can alter a record can also
//! recompute a matching digest. It catches accidental or naive edits to a
//! printed certificate. Binding integrity would need a server-held signing
//! key, which this service does not have.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use super::models::birth_record::BirthRecord;

/// Hex-encoded SHA-256 of the record's canonical form: the record ID plus
/// every stored field (attribution and both timestamps included). The derived
/// serial number is not part of the input.
pub fn tamper_evidence_hash(record: &BirthRecord) -> Result<String, serde_json::Error> {
    let canonical = canonical_json(record)?;
    Ok(digest_hex(canonical.as_bytes()))
}

/// Serialize any value to JSON with object keys sorted at every depth and no
/// insignificant whitespace. The output is stable for equal inputs regardless
/// of how serde_json orders its maps.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let value = serde_json::to_value(value)?;
    let mut out = String::new();
    write_canonical(&value, &mut out)?;
    Ok(out)
}

fn write_canonical(value: &Value, out: &mut String) -> Result<(), serde_json::Error> {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key)?);
                out.push(':');
                write_canonical(&map[key.as_str()], out)?;
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out)?;
            }
            out.push(']');
        }
        scalar => out.push_str(&serde_json::to_string(scalar)?),
    }
    Ok(())
}

fn digest_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
