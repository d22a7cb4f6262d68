//! Short-lived QR attendance tokens.
//!
//! A token binds a class id and an issuance timestamp inside a signed JWT
//! whose `exp` sits a fixed, short interval after issuance. Nothing is
//! persisted: any holder of the token text and the shared secret can verify
//! freshness independently, and expiry needs no sweeping because it is
//! embedded in the signature itself.

use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use util::config;

/// Payload carried by a QR attendance token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrClaims {
    pub class_id: i64,
    /// Issuance instant, epoch milliseconds.
    pub generated_at: i64,
    pub exp: usize,
}

/// Why a presented token was rejected. The two cases produce different user
/// guidance (rescan vs. ask the teacher for a fresh code), so they must stay
/// distinguishable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QrTokenError {
    #[error("QR Code expired")]
    Expired,
    #[error("Invalid or missing token")]
    Malformed,
}

/// Issues a signed token for `class_id`, valid for the configured window
/// (60 seconds by default) from now.
///
/// The caller is responsible for having checked that the requester owns the
/// class; issuance itself is stateless and side-effect free.
pub fn issue(class_id: i64) -> String {
    let now = Utc::now();
    let exp = now.timestamp() as usize + config::qr_token_validity_seconds() as usize;

    let claims = QrClaims {
        class_id,
        generated_at: now.timestamp_millis(),
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config::jwt_secret().as_bytes()),
    )
    .expect("QR token encoding failed")
}

/// Verifies signature and freshness of a presented token.
///
/// A token issued at T is accepted for t < T+60s and expired from T+60s on.
pub fn verify(token: &str) -> Result<QrClaims, QrTokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    // jsonwebtoken defaults to 60s of leeway, which would stretch the
    // validity window to double its length.
    validation.leeway = 0;

    let claims = decode::<QrClaims>(
        token,
        &DecodingKey::from_secret(config::jwt_secret().as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => QrTokenError::Expired,
        _ => QrTokenError::Malformed,
    })?;

    // The validator only rejects `exp < now`, which would leave the token
    // alive at the expiry second itself.
    if claims.exp as i64 <= Utc::now().timestamp() {
        return Err(QrTokenError::Expired);
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use util::AppConfig;

    fn test_config() {
        unsafe {
            std::env::set_var("DATABASE_PATH", "data/test.db");
            std::env::set_var("JWT_SECRET", "qr-test-secret");
        }
        AppConfig::set_jwt_secret("qr-test-secret");
        AppConfig::set_qr_token_validity_seconds(60u64);
    }

    #[test]
    #[serial]
    fn fresh_token_roundtrips() {
        test_config();

        let token = issue(42);
        let claims = verify(&token).expect("fresh token verifies");
        assert_eq!(claims.class_id, 42);
        assert!(claims.exp as i64 > Utc::now().timestamp());
    }

    #[test]
    #[serial]
    fn stale_token_is_expired_not_malformed() {
        test_config();

        let now = Utc::now();
        let claims = QrClaims {
            class_id: 42,
            generated_at: (now.timestamp_millis()) - 120_000,
            exp: (now.timestamp() - 60) as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config::jwt_secret().as_bytes()),
        )
        .unwrap();

        assert_eq!(verify(&token), Err(QrTokenError::Expired));
    }

    #[test]
    #[serial]
    fn token_is_expired_at_the_expiry_second() {
        test_config();

        let now = Utc::now();
        let sign = |exp: i64| {
            encode(
                &Header::default(),
                &QrClaims {
                    class_id: 7,
                    generated_at: now.timestamp_millis() - 60_000,
                    exp: exp as usize,
                },
                &EncodingKey::from_secret(config::jwt_secret().as_bytes()),
            )
            .unwrap()
        };

        // exp == now sits exactly at the end of the window and is out.
        assert_eq!(verify(&sign(now.timestamp())), Err(QrTokenError::Expired));
        // Comfortably inside the window.
        assert!(verify(&sign(now.timestamp() + 30)).is_ok());
    }

    #[test]
    #[serial]
    fn garbage_and_wrong_key_are_malformed() {
        test_config();

        assert_eq!(verify("not-a-token"), Err(QrTokenError::Malformed));
        assert_eq!(verify(""), Err(QrTokenError::Malformed));

        let claims = QrClaims {
            class_id: 42,
            generated_at: Utc::now().timestamp_millis(),
            exp: (Utc::now().timestamp() + 60) as usize,
        };
        let foreign = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"some-other-secret"),
        )
        .unwrap();
        assert_eq!(verify(&foreign), Err(QrTokenError::Malformed));
    }
}
