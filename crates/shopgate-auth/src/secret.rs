//! Secret, authorization-code, and access-token generation.
//!
//! All three credential kinds are random strings sampled uniformly from the
//! URL-safe charset `[A-Za-z0-9_-]`. Codes and tokens carry distinct
//! prefixes so that one can never be mistaken for the other.
//!
//! # Example
//!
//! ```
//! use shopgate_auth::secret::{generate_client_secret, is_charset_valid, CLIENT_SECRET_LEN};
//!
//! let secret = generate_client_secret();
//! assert_eq!(secret.len(), CLIENT_SECRET_LEN);
//! assert!(is_charset_valid(&secret));
//! ```

use rand::Rng;

/// Charset shared by client secrets, authorization codes, and access tokens.
pub const SECRET_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

/// Length of a generated client secret.
pub const CLIENT_SECRET_LEN: usize = 32;

/// Prefix identifying authorization codes.
pub const AUTH_CODE_PREFIX: &str = "authcode_";

/// Prefix identifying bearer access tokens.
pub const ACCESS_TOKEN_PREFIX: &str = "token_";

/// Length of the random part of codes and tokens.
const RANDOM_PART_LEN: usize = 32;

/// Minimum total length the request authorizer accepts for a bearer token.
pub const MIN_ACCESS_TOKEN_LEN: usize = 30;

fn random_string(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| SECRET_CHARSET[rng.gen_range(0..SECRET_CHARSET.len())] as char)
        .collect()
}

/// Generate a new 32-character client secret.
///
/// The 64-character charset gives 192 bits of entropy, well past the OAuth
/// 2.0 recommendation of 128 bits.
#[must_use]
pub fn generate_client_secret() -> String {
    random_string(CLIENT_SECRET_LEN)
}

/// Generate a fresh single-use authorization code (`authcode_` prefix).
#[must_use]
pub fn generate_authorization_code() -> String {
    format!("{AUTH_CODE_PREFIX}{}", random_string(RANDOM_PART_LEN))
}

/// Generate a fresh bearer access token (`token_` prefix).
#[must_use]
pub fn generate_access_token() -> String {
    format!("{ACCESS_TOKEN_PREFIX}{}", random_string(RANDOM_PART_LEN))
}

/// Returns `true` if every character of `value` is in [`SECRET_CHARSET`].
#[must_use]
pub fn is_charset_valid(value: &str) -> bool {
    value
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_secret_format() {
        let secret = generate_client_secret();
        assert_eq!(secret.len(), CLIENT_SECRET_LEN);
        assert!(is_charset_valid(&secret));
    }

    #[test]
    fn test_client_secret_uniqueness() {
        let a = generate_client_secret();
        let b = generate_client_secret();
        assert_ne!(a, b, "secrets should be unique");
    }

    #[test]
    fn test_authorization_code_format() {
        let code = generate_authorization_code();
        assert!(code.starts_with(AUTH_CODE_PREFIX));
        assert_eq!(code.len(), AUTH_CODE_PREFIX.len() + RANDOM_PART_LEN);
        assert!(is_charset_valid(&code));
    }

    #[test]
    fn test_access_token_format() {
        let token = generate_access_token();
        assert!(token.starts_with(ACCESS_TOKEN_PREFIX));
        assert!(token.len() >= MIN_ACCESS_TOKEN_LEN);
        assert!(is_charset_valid(&token));
    }

    #[test]
    fn test_prefixes_are_distinct() {
        assert!(!AUTH_CODE_PREFIX.starts_with(ACCESS_TOKEN_PREFIX));
        assert!(!ACCESS_TOKEN_PREFIX.starts_with(AUTH_CODE_PREFIX));
    }

    #[test]
    fn test_charset_validation() {
        assert!(is_charset_valid("Abc123_-"));
        assert!(!is_charset_valid("has space"));
        assert!(!is_charset_valid("has:colon"));
        assert!(!is_charset_valid("has+plus"));
    }
}
