// Bearer token inspection.
//
// The client never verifies signatures (the backend does); it only reads the
// claims to decide whether a stored session is still worth offering.

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Seconds of slack before `exp` at which a token already counts as expired.
pub const EXPIRY_SKEW_SECS: i64 = 30;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub exp: Option<i64>,
    pub iat: Option<i64>,
}

pub fn decode_claims(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    let data = jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)?;
    Ok(data.claims)
}

/// True when the token's `exp` is at or before `now + skew`. Opaque tokens
/// and tokens without `exp` are left for the server to judge.
pub fn is_expired_at(token: &str, now_unix: i64) -> bool {
    match decode_claims(token) {
        Ok(Claims { exp: Some(exp), .. }) => exp <= now_unix + EXPIRY_SKEW_SECS,
        _ => false,
    }
}

pub fn is_expired(token: &str) -> bool {
    is_expired_at(token, chrono::Utc::now().timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(exp: Option<i64>) -> String {
        let claims = Claims {
            sub: Some("u-1".to_string()),
            email: Some("ops@freight.test".to_string()),
            role: Some("admin".to_string()),
            exp,
            iat: Some(1_700_000_000),
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(b"server-side-secret")).unwrap()
    }

    #[test]
    fn claims_decode_without_the_signing_key() {
        let claims = decode_claims(&token(Some(2_000_000_000))).unwrap();
        assert_eq!(claims.role.as_deref(), Some("admin"));
        assert_eq!(claims.exp, Some(2_000_000_000));
    }

    #[test]
    fn expiry_uses_skew() {
        let now = 1_800_000_000;
        assert!(is_expired_at(&token(Some(now - 1)), now));
        assert!(is_expired_at(&token(Some(now + 10)), now));
        assert!(!is_expired_at(&token(Some(now + 3600)), now));
    }

    #[test]
    fn opaque_or_exp_less_tokens_are_not_judged() {
        assert!(!is_expired_at("not-a-jwt", 0));
        assert!(!is_expired_at(&token(None), i64::MAX / 2));
    }
}
