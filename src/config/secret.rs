//! Secret configuration values
//!
//! Webhook URLs usually embed an access token, so they are held in a
//! `secrecy::Secret` that redacts `Debug` output and zeroes its memory on
//! drop.
//!
//! ```rust
//! use hl7stage::config::secret_string;
//! use secrecy::ExposeSecret;
//!
//! let url = secret_string("https://hooks.example.com/T0/B0/token".to_string());
//! assert_eq!(url.expose_secret().as_ref(), "https://hooks.example.com/T0/B0/token");
//! assert!(!format!("{url:?}").contains("token"));
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret, SerializableSecret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// String payload of a [`SecretString`]
#[derive(Clone, Debug, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}
impl SerializableSecret for SecretValue {}

impl From<String> for SecretValue {
    fn from(s: String) -> Self {
        SecretValue(s)
    }
}

impl AsRef<str> for SecretValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl SecretValue {
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Serialize for SecretValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecretValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretValue)
    }
}

/// Redacted, zeroize-on-drop string
pub type SecretString = Secret<SecretValue>;

/// Wrap a plain string as a [`SecretString`]
#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_secret_string_exposes_value() {
        let secret = secret_string("https://hooks.example.com/x".to_string());
        assert_eq!(secret.expose_secret().as_ref(), "https://hooks.example.com/x");
    }

    #[test]
    fn test_secret_debug_redacted() {
        let secret = secret_string("token-123".to_string());
        let debug_output = format!("{secret:?}");
        assert!(!debug_output.contains("token-123"));
    }

    #[test]
    fn test_secret_deserializes_from_toml() {
        #[derive(Deserialize)]
        struct Alerting {
            webhook_url: SecretString,
        }

        let parsed: Alerting = toml::from_str(r#"webhook_url = "https://h.example.com""#).unwrap();
        assert_eq!(parsed.webhook_url.expose_secret().as_ref(), "https://h.example.com");
    }

    #[test]
    fn test_blank_secret_is_empty() {
        assert!(secret_string("  ".to_string()).expose_secret().is_empty());
    }
}
