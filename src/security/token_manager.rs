//! Publish credential handling with masking
//!
//! The hosting token is read from the environment into a [`SecretString`] so it
//! never ends up in `Debug` output, and every string that could carry it
//! (remote URLs, command errors) is masked before it is shown.

use crate::core::error::ReleaseError;
use secrecy::{ExposeSecret, SecretString};
use std::env;

/// Token manager for the hosting credential
///
/// # Examples
///
/// ```
/// use cdn_release::security::SecureTokenManager;
///
/// let manager = SecureTokenManager::new("CDN_RELEASE_DOC_TOKEN");
/// assert_eq!(manager.token_name(), "CDN_RELEASE_DOC_TOKEN");
/// assert_eq!(manager.mask_token("abcdef123456"), "abc...456");
/// ```
#[derive(Debug, Clone)]
pub struct SecureTokenManager {
    token_env: String,
}

impl SecureTokenManager {
    pub fn new(token_env: &str) -> Self {
        Self {
            token_env: token_env.to_string(),
        }
    }

    /// Environment variable the token is read from
    pub fn token_name(&self) -> &str {
        &self.token_env
    }

    /// Read the token, treating an empty value as unset
    pub fn get_token(&self) -> Option<SecretString> {
        let value = env::var(&self.token_env).ok()?;
        if value.trim().is_empty() {
            return None;
        }
        Some(SecretString::new(value.into()))
    }

    /// Read the token or fail with `TokenMissing`
    pub fn require_token(&self) -> Result<SecretString, ReleaseError> {
        self.get_token().ok_or_else(|| ReleaseError::TokenMissing {
            variable: self.token_env.clone(),
        })
    }

    pub fn has_token(&self) -> bool {
        self.get_token().is_some()
    }

    /// Masks a token for safe logging
    ///
    /// Shows only the first 3 and last 3 characters. Tokens shorter than 10
    /// characters are fully masked as "****".
    pub fn mask_token(&self, token: &str) -> String {
        let chars: Vec<char> = token.chars().collect();
        if chars.len() < 10 {
            return "****".to_string();
        }

        let prefix: String = chars[..3].iter().collect();
        let suffix: String = chars[chars.len() - 3..].iter().collect();
        format!("{}...{}", prefix, suffix)
    }

    /// Replace every occurrence of the current token in `text` with its mask
    pub fn mask_tokens_in_string(&self, text: &str) -> String {
        match self.get_token() {
            Some(token) => {
                let token_str = token.expose_secret();
                text.replace(token_str, &self.mask_token(token_str))
            }
            None => text.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_token_returns_secret_when_env_var_set() {
        unsafe {
            env::set_var("CDN_RELEASE_TEST_TOKEN_SET", "ghp-test-token-12345");
        }
        let manager = SecureTokenManager::new("CDN_RELEASE_TEST_TOKEN_SET");
        let token = manager.get_token();
        assert!(token.is_some());
        assert_eq!(token.unwrap().expose_secret(), "ghp-test-token-12345");
        unsafe {
            env::remove_var("CDN_RELEASE_TEST_TOKEN_SET");
        }
    }

    #[test]
    fn test_require_token_when_missing() {
        unsafe {
            env::remove_var("CDN_RELEASE_TEST_TOKEN_MISSING");
        }
        let manager = SecureTokenManager::new("CDN_RELEASE_TEST_TOKEN_MISSING");

        match manager.require_token() {
            Err(ReleaseError::TokenMissing { variable }) => {
                assert_eq!(variable, "CDN_RELEASE_TEST_TOKEN_MISSING");
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
        assert!(!manager.has_token());
    }

    #[test]
    fn test_blank_token_is_unset() {
        unsafe {
            env::set_var("CDN_RELEASE_TEST_TOKEN_BLANK", "   ");
        }
        let manager = SecureTokenManager::new("CDN_RELEASE_TEST_TOKEN_BLANK");
        assert!(!manager.has_token());
        unsafe {
            env::remove_var("CDN_RELEASE_TEST_TOKEN_BLANK");
        }
    }

    #[test]
    fn test_mask_token_with_short_token() {
        let manager = SecureTokenManager::new("UNUSED");
        assert_eq!(manager.mask_token("short"), "****");
        assert_eq!(manager.mask_token(""), "****");
    }

    #[test]
    fn test_mask_token_with_long_token() {
        let manager = SecureTokenManager::new("UNUSED");
        assert_eq!(manager.mask_token("abcdef123456"), "abc...456");
        assert_eq!(manager.mask_token("very-long-token-string"), "ver...ing");
    }

    #[test]
    fn test_mask_tokens_in_string_with_token() {
        unsafe {
            env::set_var("CDN_RELEASE_TEST_TOKEN_MASK", "secret-gh-token-12345");
        }
        let manager = SecureTokenManager::new("CDN_RELEASE_TEST_TOKEN_MASK");
        let input = "https://secret-gh-token-12345@github.com/o/r.git";
        let output = manager.mask_tokens_in_string(input);
        assert_eq!(output, "https://sec...345@github.com/o/r.git");
        unsafe {
            env::remove_var("CDN_RELEASE_TEST_TOKEN_MASK");
        }
    }

    #[test]
    fn test_mask_tokens_in_string_no_token() {
        let manager = SecureTokenManager::new("CDN_RELEASE_TEST_TOKEN_NEVER_SET");
        let input = "This is a safe string with no tokens";
        assert_eq!(manager.mask_tokens_in_string(input), input);
    }
}
