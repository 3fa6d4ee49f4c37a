use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::database::User;
use crate::security::{digest, Key};

/// Prefix accepted (and emitted) on the authorization header
pub const AUTHORIZATION_SCHEME: &str = "Bearer";

/// Scope claim carried by every issued token
pub const SCOPE: &str = "app";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub org: String,
    /// Email digest of the user at issue time
    pub aud: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub scope: String,
}

/// Bearer string plus its expiry (unix seconds)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub bearer: String,
    pub expires: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token generation failed: {0}")]
    Generation(String),

    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Token expired")]
    Expired,

    #[error("Token subject does not match caller")]
    SubjectMismatch,

    #[error("Token claims do not match session")]
    ClaimsMismatch,
}

/// Issues and verifies per-user HS256 tokens.
///
/// Each token is signed with the user id prepended to the service signing
/// key, so a token minted for one user cannot verify under another id.
#[derive(Debug, Clone)]
pub struct TokenService {
    signing_key: Key,
    issuer: String,
    validity_secs: i64,
}

impl TokenService {
    pub fn new(signing_key: Key, issuer: impl Into<String>, validity_secs: i64) -> Self {
        Self {
            signing_key,
            issuer: issuer.into(),
            validity_secs,
        }
    }

    pub fn validity_secs(&self) -> i64 {
        self.validity_secs
    }

    pub fn claims_for(&self, user: &User, now: i64) -> Claims {
        Claims {
            sub: user.id.clone(),
            org: user.org.clone(),
            aud: user.email_digest.clone(),
            iss: self.issuer.clone(),
            iat: now,
            exp: now + self.validity_secs,
            scope: SCOPE.to_string(),
        }
    }

    pub fn issue(&self, user: &User) -> Result<Token, TokenError> {
        self.issue_at(user, Utc::now().timestamp())
    }

    /// Issue as if the current time were `now`
    pub fn issue_at(&self, user: &User, now: i64) -> Result<Token, TokenError> {
        let claims = self.claims_for(user, now);
        let bearer = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.user_key(&user.id)),
        )
        .map_err(|e| TokenError::Generation(e.to_string()))?;

        Ok(Token {
            bearer,
            expires: claims.exp,
        })
    }

    pub fn verify(&self, claimed_user_id: &str, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(claimed_user_id, token, Utc::now().timestamp())
    }

    /// Check signature, issuer and subject, then expiry against `now`.
    /// A token is still good in the second it expires.
    pub fn verify_at(&self, claimed_user_id: &str, token: &str, now: i64) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);

        let claims = decode::<Claims>(
            strip_scheme(token),
            &DecodingKey::from_secret(&self.user_key(claimed_user_id)),
            &validation,
        )
        .map_err(|e| TokenError::Invalid(e.to_string()))?
        .claims;

        if claims.sub != claimed_user_id {
            return Err(TokenError::SubjectMismatch);
        }
        if claims.exp < now {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    fn user_key(&self, user_id: &str) -> Vec<u8> {
        let mut key = Vec::with_capacity(user_id.len() + self.signing_key.as_bytes().len());
        key.extend_from_slice(user_id.as_bytes());
        key.extend_from_slice(self.signing_key.as_bytes());
        key
    }
}

/// Claims must still describe the caller's current org and email
pub fn check_binding(claims: &Claims, user: &User) -> Result<(), TokenError> {
    if claims.org != user.org || claims.aud != user.email_digest {
        return Err(TokenError::ClaimsMismatch);
    }
    Ok(())
}

pub fn to_header_value(bearer: &str) -> String {
    format!("{AUTHORIZATION_SCHEME} {bearer}")
}

/// Accept both `Bearer <token>` and a bare token
pub fn strip_scheme(value: &str) -> &str {
    value
        .strip_prefix(AUTHORIZATION_SCHEME)
        .and_then(|rest| rest.strip_prefix(' '))
        .unwrap_or(value)
        .trim()
}

/// Value a client presents to prove it holds the api secret for `user_id`
pub fn token_request_digest(user_id: &str, api_secret: &str) -> String {
    digest(&format!("{user_id}{api_secret}"))
}

/// Constant-time check of a presented token-request value
pub fn token_request_matches(user: &User, presented: &str) -> bool {
    let expected = token_request_digest(&user.id, &user.api_secret);
    expected.as_bytes().ct_eq(presented.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::fixtures;

    fn service() -> TokenService {
        TokenService::new(Key::random(), "orgkeep-test", 3600)
    }

    fn user() -> User {
        User::new(&fixtures::codec(), "Alice", "alice@example.com", "org-1", "pw").unwrap()
    }

    #[test]
    fn issued_token_verifies() {
        let tokens = service();
        let user = user();
        let token = tokens.issue_at(&user, 1_000).unwrap();
        assert_eq!(token.expires, 4_600);

        let claims = tokens.verify_at(&user.id, &token.bearer, 2_000).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.org, "org-1");
        assert_eq!(claims.aud, digest("alice@example.com"));
        assert_eq!(claims.scope, SCOPE);
        assert_eq!(claims.iat, 1_000);
        assert!(check_binding(&claims, &user).is_ok());
    }

    #[test]
    fn scheme_prefix_is_optional() {
        let tokens = service();
        let user = user();
        let token = tokens.issue_at(&user, 1_000).unwrap();
        let header = to_header_value(&token.bearer);
        assert!(header.starts_with("Bearer "));
        assert!(tokens.verify_at(&user.id, &header, 1_000).is_ok());
        assert_eq!(strip_scheme(&header), token.bearer);
        assert_eq!(strip_scheme(&token.bearer), token.bearer);
    }

    #[test]
    fn expiry_boundary() {
        let tokens = service();
        let user = user();
        let token = tokens.issue_at(&user, 1_000).unwrap();
        assert!(tokens.verify_at(&user.id, &token.bearer, 4_600).is_ok());
        assert_eq!(
            tokens.verify_at(&user.id, &token.bearer, 4_601),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn token_is_bound_to_user_id() {
        let tokens = service();
        let alice = user();
        let bob = User::new(&fixtures::codec(), "Bob", "bob@example.com", "org-1", "pw").unwrap();
        let token = tokens.issue_at(&alice, 1_000).unwrap();
        assert!(matches!(
            tokens.verify_at(&bob.id, &token.bearer, 1_000),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn subject_must_match_claimed_id() {
        let tokens = service();
        let alice = user();
        let bob = User::new(&fixtures::codec(), "Bob", "bob@example.com", "org-1", "pw").unwrap();

        // alice's claims signed with the key derived for bob
        let forged = encode(
            &Header::new(Algorithm::HS256),
            &tokens.claims_for(&alice, 1_000),
            &EncodingKey::from_secret(&tokens.user_key(&bob.id)),
        )
        .unwrap();
        assert_eq!(
            tokens.verify_at(&bob.id, &forged, 1_000),
            Err(TokenError::SubjectMismatch)
        );
    }

    #[test]
    fn other_signing_key_rejected() {
        let user = user();
        let token = service().issue_at(&user, 1_000).unwrap();
        assert!(matches!(
            service().verify_at(&user.id, &token.bearer, 1_000),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn garbage_rejected() {
        let user = user();
        assert!(matches!(
            service().verify_at(&user.id, "not.a.token", 1_000),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn binding_follows_org_and_email() {
        let tokens = service();
        let mut user = user();
        let claims = tokens.claims_for(&user, 1_000);

        user.org = "org-2".to_string();
        assert_eq!(check_binding(&claims, &user), Err(TokenError::ClaimsMismatch));

        let mut user = self::user();
        let claims = tokens.claims_for(&user, 1_000);
        user.email_digest = digest("changed@example.com");
        assert_eq!(check_binding(&claims, &user), Err(TokenError::ClaimsMismatch));
    }

    #[test]
    fn token_request_digest_matches() {
        let user = user();
        let good = token_request_digest(&user.id, &user.api_secret);
        assert!(token_request_matches(&user, &good));
        assert!(!token_request_matches(&user, &digest("wrong")));
        assert!(!token_request_matches(&user, ""));
    }
}
