//! Best-effort reading of session claims.
//!
//! The resolver must decide between ANONYMOUS and PERMANENT without
//! ever failing: a token it cannot parse is still evidence that the
//! caller holds a session. Decoding here is unverified; signature
//! checks belong to the provider that produced the session.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use uuid::Uuid;

/// What a claim source says about anonymity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anonymity {
    Anonymous,
    Permanent,
    Unknown,
}

impl Anonymity {
    pub fn from_flag(flag: Option<bool>) -> Self {
        match flag {
            Some(true) => Anonymity::Anonymous,
            Some(false) => Anonymity::Permanent,
            None => Anonymity::Unknown,
        }
    }

    /// Keep `self` unless it is inconclusive.
    pub fn or(self, fallback: Anonymity) -> Anonymity {
        match self {
            Anonymity::Unknown => fallback,
            known => known,
        }
    }
}

/// Claims recovered from a JWT-like token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    pub subject: Option<Uuid>,
    pub anonymity: Anonymity,
}

impl SessionClaims {
    pub fn unknown() -> Self {
        Self {
            subject: None,
            anonymity: Anonymity::Unknown,
        }
    }

    /// Decode the payload segment of `token`. Never fails; anything
    /// unreadable comes back as [`Anonymity::Unknown`] with no subject.
    pub fn decode(token: &str) -> Self {
        let Some(payload) = token.split('.').nth(1) else {
            return Self::unknown();
        };
        let Ok(bytes) = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')) else {
            return Self::unknown();
        };
        let Ok(value) = serde_json::from_slice::<serde_json::Value>(&bytes) else {
            return Self::unknown();
        };

        let subject = value
            .get("sub")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok());
        let anonymity = Anonymity::from_flag(value.get("is_anonymous").and_then(|v| v.as_bool()));

        Self { subject, anonymity }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with(payload: serde_json::Value) -> String {
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("eyJhbGciOiJFZERTQSJ9.{body}.c2ln")
    }

    #[test]
    fn reads_subject_and_flag() {
        let id = Uuid::new_v4();
        let claims = SessionClaims::decode(&token_with(serde_json::json!({
            "sub": id.to_string(),
            "is_anonymous": true,
        })));
        assert_eq!(claims.subject, Some(id));
        assert_eq!(claims.anonymity, Anonymity::Anonymous);
    }

    #[test]
    fn missing_flag_is_unknown() {
        let claims = SessionClaims::decode(&token_with(serde_json::json!({
            "sub": Uuid::new_v4().to_string(),
        })));
        assert_eq!(claims.anonymity, Anonymity::Unknown);
        assert!(claims.subject.is_some());
    }

    #[test]
    fn garbage_never_panics() {
        for token in ["", "abc", "a.b.c", "a.!!!.c", "a..c"] {
            assert_eq!(SessionClaims::decode(token), SessionClaims::unknown());
        }
    }

    #[test]
    fn non_boolean_flag_is_unknown() {
        let claims = SessionClaims::decode(&token_with(serde_json::json!({
            "sub": "not-a-uuid",
            "is_anonymous": "yes",
        })));
        assert_eq!(claims, SessionClaims::unknown());
    }

    #[test]
    fn fallback_only_applies_when_unknown() {
        assert_eq!(
            Anonymity::Permanent.or(Anonymity::Anonymous),
            Anonymity::Permanent
        );
        assert_eq!(
            Anonymity::Unknown.or(Anonymity::Anonymous),
            Anonymity::Anonymous
        );
    }
}
