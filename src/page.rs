//! Opaque pagination tokens for list operations.
//!
//! A token encodes the offset of the next item as base64-wrapped JSON.
//! Tokens are opaque to callers and are only meaningful against the store
//! instance that issued them; they do not survive process restarts.

use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct PageToken {
    offset: usize,
}

impl PageToken {
    fn encode(&self) -> String {
        // Serializing a single integer field cannot fail.
        let json = serde_json::to_vec(self).unwrap_or_default();
        general_purpose::STANDARD.encode(json)
    }

    fn decode(token: &str) -> Result<Self> {
        general_purpose::STANDARD
            .decode(token)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .ok_or_else(|| Error::InvalidArgument(format!("invalid page token {:?}", token)))
    }
}

/// Slices one page out of a full, creation-ordered result set.
///
/// Returns the page plus the token for the next one; the token is empty when
/// the listing is exhausted. An empty input token starts from the beginning;
/// an undecodable token is an invalid-argument failure.
pub(crate) fn paginate<T>(items: Vec<T>, page_size: usize, token: &str) -> Result<(Vec<T>, String)> {
    let offset = if token.is_empty() {
        0
    } else {
        PageToken::decode(token)?.offset
    };

    let total = items.len();
    let page: Vec<T> = items.into_iter().skip(offset).take(page_size).collect();

    let end = offset + page.len();
    let next_token = if end < total {
        PageToken { offset: end }.encode()
    } else {
        String::new()
    };

    Ok((page, next_token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate_walks_all_items_in_order() {
        let items: Vec<u32> = (0..10).collect();

        let (page, token) = paginate(items.clone(), 4, "").unwrap();
        assert_eq!(page, vec![0, 1, 2, 3]);
        assert!(!token.is_empty());

        let (page, token) = paginate(items.clone(), 4, &token).unwrap();
        assert_eq!(page, vec![4, 5, 6, 7]);
        assert!(!token.is_empty());

        let (page, token) = paginate(items, 4, &token).unwrap();
        assert_eq!(page, vec![8, 9]);
        assert!(token.is_empty());
    }

    #[test]
    fn test_paginate_single_page() {
        let (page, token) = paginate(vec![1, 2, 3], 10, "").unwrap();
        assert_eq!(page, vec![1, 2, 3]);
        assert!(token.is_empty());
    }

    #[test]
    fn test_paginate_offset_past_end_yields_empty_page() {
        let token = PageToken { offset: 100 }.encode();
        let (page, next) = paginate(vec![1, 2, 3], 10, &token).unwrap();
        assert!(page.is_empty());
        assert!(next.is_empty());
    }

    #[test]
    fn test_malformed_token_rejected() {
        for token in ["not base64!", "bm90IGpzb24", "AAAA"] {
            let err = paginate(vec![1], 10, token).unwrap_err();
            assert!(
                matches!(err, Error::InvalidArgument(_)),
                "expected invalid-argument for token {:?}, got {:?}",
                token,
                err
            );
        }
    }

    #[test]
    fn test_token_round_trip() {
        let token = PageToken { offset: 42 };
        assert_eq!(PageToken::decode(&token.encode()).unwrap(), token);
    }
}
