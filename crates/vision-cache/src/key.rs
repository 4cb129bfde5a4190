use query_guard::{Identifier, ValidationError};
use serde::Serialize;
use std::fmt;

/// Compound key of a cached verdict. Every part is a validated, non-empty
/// string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheKey {
    pub screenshot_hash: Identifier,
    pub assertion: Identifier,
    pub model: Identifier,
    pub prompt_version: Identifier,
}

impl CacheKey {
    pub fn new(
        screenshot_hash: &str,
        assertion: &str,
        model: &str,
        prompt_version: &str,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            screenshot_hash: Identifier::parse("screenshotHash", screenshot_hash)?,
            assertion: Identifier::parse("assertion", assertion)?,
            model: Identifier::parse("model", model)?,
            prompt_version: Identifier::parse("promptVersion", prompt_version)?,
        })
    }

    /// Key for raw PNG bytes.
    pub fn for_screenshot(
        png: &[u8],
        assertion: &str,
        model: &str,
        prompt_version: &str,
    ) -> Result<Self, ValidationError> {
        Self::new(&screenshot_hash(png), assertion, model, prompt_version)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hash: String = self.screenshot_hash.as_str().chars().take(12).collect();
        write!(
            f,
            "{}/{}@{}:{}",
            hash,
            self.model,
            self.prompt_version,
            self.assertion
        )
    }
}

/// BLAKE3 digest of the screenshot, lowercase hex.
pub fn screenshot_hash(png: &[u8]) -> String {
    blake3::hash(png).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_hex() {
        let a = screenshot_hash(b"png bytes");
        assert_eq!(a.len(), 64);
        assert_eq!(a, screenshot_hash(b"png bytes"));
        assert_ne!(a, screenshot_hash(b"other bytes"));
    }

    #[test]
    fn rejects_blank_parts() {
        assert!(CacheKey::new("h1", "", "m1", "v1").is_err());
        assert!(CacheKey::new("h1", "a1", "m1", " ").is_err());
        let key = CacheKey::new("h1", " a1 ", "m1", "v1").unwrap();
        assert_eq!(key.assertion.as_str(), "a1");
    }
}
