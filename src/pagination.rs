//! Continuation tokens for cursor-paginated listings.
//!
//! A token carries the last identity returned (the cursor) together with the
//! filter that produced the page. Resuming with a different filter is
//! rejected, so a caller cannot silently switch filters mid-pagination.
//! Tokens are signed so the embedded cursor and filter cannot be forged.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64_URL, Engine};
use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

use crate::models::MarketStatus;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid page token")]
    Malformed,

    #[error("invalid page token")]
    BadSignature,

    #[error("invalid page token")]
    FilterMismatch,

    #[error("failed to encode page token: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("page token key rejected: {0}")]
    Key(String),
}

/// A listing filter that can be embedded in a continuation token.
/// Equality is structural and excludes page size and page token.
pub trait ListFilter: Serialize + DeserializeOwned + PartialEq {
    /// Distinguishes token families so a market token cannot resume a bet listing.
    const KIND: &'static str;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketFilter {
    pub status: Option<MarketStatus>,
}

impl ListFilter for MarketFilter {
    const KIND: &'static str = "markets";
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetFilter {
    pub market_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

impl ListFilter for BetFilter {
    const KIND: &'static str = "bets";
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFilter {}

impl ListFilter for UserFilter {
    const KIND: &'static str = "users";
}

#[derive(Serialize, Deserialize)]
struct Envelope<F> {
    kind: String,
    cursor: Uuid,
    filter: F,
}

/// Decoded continuation token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageToken<F> {
    pub cursor: Uuid,
    pub filter: F,
}

#[derive(Clone)]
pub struct PageTokenCodec {
    key: Vec<u8>,
}

impl PageTokenCodec {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            key: secret.as_ref().to_vec(),
        }
    }

    /// Codec keyed with a fresh random secret.
    pub fn ephemeral() -> Self {
        let mut key = Vec::with_capacity(32);
        key.extend_from_slice(Uuid::new_v4().as_bytes());
        key.extend_from_slice(Uuid::new_v4().as_bytes());
        Self { key }
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(&self.key).map_err(|e| TokenError::Key(e.to_string()))
    }

    /// token = base64url(json envelope) "." base64url(hmac-sha256(json))
    pub fn encode<F: ListFilter>(&self, cursor: Uuid, filter: &F) -> Result<String, TokenError> {
        let body = serde_json::to_vec(&Envelope {
            kind: F::KIND.to_string(),
            cursor,
            filter,
        })?;

        let mut mac = self.mac()?;
        mac.update(&body);
        let tag = mac.finalize().into_bytes();

        Ok(format!(
            "{}.{}",
            BASE64_URL.encode(&body),
            BASE64_URL.encode(tag)
        ))
    }

    pub fn decode<F: ListFilter>(&self, token: &str) -> Result<PageToken<F>, TokenError> {
        let (body_b64, tag_b64) = token.split_once('.').ok_or(TokenError::Malformed)?;
        let body = BASE64_URL
            .decode(body_b64)
            .map_err(|_| TokenError::Malformed)?;
        let tag = BASE64_URL
            .decode(tag_b64)
            .map_err(|_| TokenError::Malformed)?;

        let mut mac = self.mac()?;
        mac.update(&body);
        mac.verify_slice(&tag).map_err(|_| TokenError::BadSignature)?;

        let envelope: Envelope<F> =
            serde_json::from_slice(&body).map_err(|_| TokenError::Malformed)?;
        if envelope.kind != F::KIND {
            return Err(TokenError::Malformed);
        }

        Ok(PageToken {
            cursor: envelope.cursor,
            filter: envelope.filter,
        })
    }

    /// Resolve the cursor to resume from. An absent or empty token starts
    /// from the beginning; a token minted for a different filter is rejected.
    pub fn resume<F: ListFilter>(
        &self,
        token: Option<&str>,
        filter: &F,
    ) -> Result<Option<Uuid>, TokenError> {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return Ok(None);
        };
        let decoded: PageToken<F> = self.decode(token)?;
        if &decoded.filter != filter {
            return Err(TokenError::FilterMismatch);
        }
        Ok(Some(decoded.cursor))
    }
}

/// Page size policy: honour a requested size in `1..=max`, otherwise fall
/// back to the default.
#[derive(Debug, Clone, Copy)]
pub struct PageSizes {
    pub default: usize,
    pub max: usize,
}

impl PageSizes {
    pub fn resolve(&self, requested: Option<usize>) -> usize {
        match requested {
            Some(n) if n > 0 && n <= self.max => n,
            _ => self.default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> PageTokenCodec {
        PageTokenCodec::new("test-secret")
    }

    #[test]
    fn resume_with_same_filter_yields_cursor() {
        let cursor = Uuid::new_v4();
        let filter = MarketFilter {
            status: Some(MarketStatus::Open),
        };
        let token = codec().encode(cursor, &filter).unwrap();

        assert_eq!(codec().resume(Some(&token), &filter).unwrap(), Some(cursor));
    }

    #[test]
    fn resume_with_changed_filter_is_rejected() {
        let token = codec()
            .encode(
                Uuid::new_v4(),
                &MarketFilter {
                    status: Some(MarketStatus::Open),
                },
            )
            .unwrap();

        let err = codec()
            .resume(
                Some(&token),
                &MarketFilter {
                    status: Some(MarketStatus::Settled),
                },
            )
            .unwrap_err();
        assert!(matches!(err, TokenError::FilterMismatch));
    }

    #[test]
    fn token_from_other_listing_is_rejected() {
        let token = codec()
            .encode(Uuid::new_v4(), &BetFilter::default())
            .unwrap();
        let err = codec()
            .resume(Some(&token), &UserFilter::default())
            .unwrap_err();
        assert!(matches!(err, TokenError::Malformed));
    }

    #[test]
    fn tampered_token_fails_signature() {
        let token = codec()
            .encode(Uuid::new_v4(), &MarketFilter::default())
            .unwrap();
        let other = PageTokenCodec::new("another-secret");
        assert!(matches!(
            other.decode::<MarketFilter>(&token),
            Err(TokenError::BadSignature)
        ));
        assert!(matches!(
            codec().decode::<MarketFilter>("not-a-token"),
            Err(TokenError::Malformed)
        ));
    }

    #[test]
    fn empty_token_starts_from_beginning() {
        let filter = MarketFilter::default();
        assert_eq!(codec().resume(None, &filter).unwrap(), None);
        assert_eq!(codec().resume(Some(""), &filter).unwrap(), None);
    }

    #[test]
    fn page_size_falls_back_to_default() {
        let sizes = PageSizes {
            default: 50,
            max: 100,
        };
        assert_eq!(sizes.resolve(None), 50);
        assert_eq!(sizes.resolve(Some(0)), 50);
        assert_eq!(sizes.resolve(Some(101)), 50);
        assert_eq!(sizes.resolve(Some(2)), 2);
        assert_eq!(sizes.resolve(Some(100)), 100);
    }
}
