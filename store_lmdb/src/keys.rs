//! Binary key layouts for the request indexes.
//!
//! All multi-byte integers are big-endian so LMDB's lexicographic key order
//! matches numeric order. User ids are length-prefixed (u16 BE) so that one
//! user's prefix can never be a prefix of another user's keys.
//!
//! | database       | key                                        | value           |
//! |----------------|--------------------------------------------|-----------------|
//! | `requests`     | `id`                                       | bincode record  |
//! | `user_index`   | `user ++ submitted_at ++ id`               | empty           |
//! | `status_index` | `status_tag ++ submitted_at ++ id`         | role tag        |
//! | `timeline`     | `submitted_at ++ id`                       | role tag        |
//! | `pending`      | `user`                                     | `id`            |
//!
//! The listing indexes carry the submitter's role so a role-filtered page
//! can be counted and windowed from index entries alone.

use std::ops::Bound;

use vetting_types::{RequestId, Role, Timestamp, UserId, VerificationStatus};

use crate::LmdbError;

pub(crate) fn request_key(id: RequestId) -> [u8; 8] {
    id.to_be_bytes()
}

/// Longest user id that fits in a key. LMDB keys are capped at 511 bytes
/// and the user index appends 16 bytes after the prefix.
pub(crate) const MAX_USER_KEY_BYTES: usize = 256;

pub(crate) fn user_prefix(user: &UserId) -> Result<Vec<u8>, LmdbError> {
    let raw = user.as_str().as_bytes();
    if raw.len() > MAX_USER_KEY_BYTES {
        return Err(LmdbError::KeyTooLong {
            what: "user id",
            len: raw.len(),
            max: MAX_USER_KEY_BYTES,
        });
    }
    let mut key = Vec::with_capacity(2 + raw.len());
    // Bounded above, so the length fits in a u16.
    key.extend_from_slice(&(raw.len() as u16).to_be_bytes());
    key.extend_from_slice(raw);
    Ok(key)
}

fn recency_suffix(submitted_at: Timestamp, id: RequestId) -> [u8; 16] {
    let mut suffix = [0u8; 16];
    suffix[..8].copy_from_slice(&submitted_at.to_be_bytes());
    suffix[8..].copy_from_slice(&id.to_be_bytes());
    suffix
}

pub(crate) fn user_index_key(
    user: &UserId,
    submitted_at: Timestamp,
    id: RequestId,
) -> Result<Vec<u8>, LmdbError> {
    let mut key = user_prefix(user)?;
    key.extend_from_slice(&recency_suffix(submitted_at, id));
    Ok(key)
}

pub(crate) fn status_index_key(
    status: VerificationStatus,
    submitted_at: Timestamp,
    id: RequestId,
) -> Vec<u8> {
    let mut key = Vec::with_capacity(17);
    key.push(status.tag());
    key.extend_from_slice(&recency_suffix(submitted_at, id));
    key
}

pub(crate) fn timeline_key(submitted_at: Timestamp, id: RequestId) -> [u8; 16] {
    recency_suffix(submitted_at, id)
}

pub(crate) fn role_value(role: Role) -> [u8; 1] {
    [role.tag()]
}

pub(crate) fn decode_role_value(value: &[u8]) -> Result<Role, LmdbError> {
    match value {
        [tag] => Role::from_tag(*tag)
            .ok_or_else(|| LmdbError::Corruption(format!("unknown role tag {tag}"))),
        _ => Err(LmdbError::Corruption(format!(
            "listing index value has {} bytes",
            value.len()
        ))),
    }
}

/// The request id is always the trailing 8 bytes of an index key.
pub(crate) fn trailing_request_id(key: &[u8]) -> Result<RequestId, LmdbError> {
    decode_request_id(key.get(key.len().saturating_sub(8)..).unwrap_or_default())
}

pub(crate) fn decode_request_id(bytes: &[u8]) -> Result<RequestId, LmdbError> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| LmdbError::Corruption(format!("request id has {} bytes", bytes.len())))?;
    Ok(RequestId::from_be_bytes(arr))
}

/// Increment `prefix` to the smallest key greater than every key starting
/// with it. Returns `false` if no such key exists (prefix was all `0xFF`).
pub(crate) fn increment_prefix(prefix: &mut Vec<u8>) -> bool {
    while let Some(last) = prefix.pop() {
        if last < u8::MAX {
            prefix.push(last + 1);
            return true;
        }
    }
    false
}

/// Range bounds covering every key that starts with `prefix`.
pub(crate) fn prefix_bounds(prefix: &[u8]) -> (Bound<Vec<u8>>, Bound<Vec<u8>>) {
    let mut upper = prefix.to_vec();
    let upper = if increment_prefix(&mut upper) {
        Bound::Excluded(upper)
    } else {
        Bound::Unbounded
    };
    (Bound::Included(prefix.to_vec()), upper)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_carries() {
        let mut p = vec![0x01, 0xFF];
        assert!(increment_prefix(&mut p));
        assert_eq!(p, vec![0x02]);

        let mut all_ff = vec![0xFF, 0xFF];
        assert!(!increment_prefix(&mut all_ff));
    }

    #[test]
    fn user_prefixes_do_not_nest() {
        let short = user_prefix(&UserId::new("ab")).unwrap();
        let long = user_prefix(&UserId::new("abc")).unwrap();
        assert!(!long.starts_with(&short));
    }

    #[test]
    fn index_keys_sort_by_recency_then_id() {
        let user = UserId::new("u");
        let a = user_index_key(&user, Timestamp::new(10), RequestId::new(9)).unwrap();
        let b = user_index_key(&user, Timestamp::new(11), RequestId::new(1)).unwrap();
        let c = user_index_key(&user, Timestamp::new(11), RequestId::new(2)).unwrap();
        assert!(a < b && b < c);
    }

    #[test]
    fn trailing_id_is_recovered() {
        let key = status_index_key(VerificationStatus::Rejected, Timestamp::new(5), RequestId::new(77));
        assert_eq!(trailing_request_id(&key).unwrap(), RequestId::new(77));
        assert!(decode_request_id(&[1, 2, 3]).is_err());
    }

    #[test]
    fn oversized_user_id_is_refused_not_truncated() {
        let at_limit = UserId::new("u".repeat(MAX_USER_KEY_BYTES));
        assert_eq!(user_prefix(&at_limit).unwrap().len(), 2 + MAX_USER_KEY_BYTES);

        let huge = UserId::new("u".repeat(70_000));
        assert!(matches!(
            user_prefix(&huge),
            Err(LmdbError::KeyTooLong { len: 70_000, .. })
        ));
    }

    #[test]
    fn role_values_round_trip() {
        for role in Role::ALL {
            assert_eq!(decode_role_value(&role_value(role)).unwrap(), role);
        }
        assert!(decode_role_value(&[]).is_err());
        assert!(decode_role_value(&[42]).is_err());
    }
}
