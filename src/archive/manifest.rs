//! The archive manifest: maps encrypted members back to original files.

use crate::config::NONCE_LENGTH;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// One encrypted file in the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Relative path of the original file, `/` separated.
    pub original_name: String,
    /// Name of the archive member holding the ciphertext.
    ///
    /// Used as an opaque lookup key when decrypting.
    pub encrypted_name: String,
    /// Nonce the file was encrypted under, as 24 lowercase hex characters.
    #[serde(with = "hex_nonce")]
    pub iv: [u8; NONCE_LENGTH],
}

impl ManifestEntry {
    /// Create a new entry.
    pub fn new(original_name: String, encrypted_name: String, iv: [u8; NONCE_LENGTH]) -> Self {
        Self {
            original_name,
            encrypted_name,
            iv,
        }
    }
}

/// Index of every file encrypted in one run, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub files: Vec<ManifestEntry>,
}

impl Manifest {
    /// Create an empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the manifest has no entries.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Find the entry for an encrypted member name.
    pub fn find(&self, encrypted_name: &str) -> Option<&ManifestEntry> {
        self.files.iter().find(|e| e.encrypted_name == encrypted_name)
    }

    /// Serialize to compact JSON.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse a decrypted manifest document.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).map_err(|e| Error::ManifestFormat(e.to_string()))
    }
}

mod hex_nonce {
    use crate::config::NONCE_LENGTH;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(iv: &[u8; NONCE_LENGTH], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(iv))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; NONCE_LENGTH], D::Error> {
        let s = String::deserialize(deserializer)?;
        let mut iv = [0u8; NONCE_LENGTH];
        hex::decode_to_slice(&s, &mut iv)
            .map_err(|e| D::Error::custom(format!("invalid iv {:?}: {}", s, e)))?;
        Ok(iv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Manifest {
        Manifest {
            files: vec![
                ManifestEntry::new("a.txt".to_string(), "a.txt.enc".to_string(), [0xAB; 12]),
                ManifestEntry::new(
                    "docs/b.bin".to_string(),
                    "docs/b.bin.enc".to_string(),
                    [0x01; 12],
                ),
            ],
        }
    }

    #[test]
    fn test_json_shape() {
        let json: serde_json::Value = serde_json::from_slice(&sample().to_bytes().unwrap()).unwrap();

        let files = json["files"].as_array().unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0]["original_name"], "a.txt");
        assert_eq!(files[0]["encrypted_name"], "a.txt.enc");
        assert_eq!(files[0]["iv"], "abababababababababababab");
        assert_eq!(files[1]["iv"].as_str().unwrap().len(), 24);
    }

    #[test]
    fn test_parse_preserves_order() {
        let manifest = sample();
        let parsed = Manifest::from_bytes(&manifest.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed, manifest);
    }

    #[test]
    fn test_parse_foreign_writer() {
        // Pretty-printed, spaced output as written by other implementations.
        let doc = br#"{
            "files": [
                {"original_name": "x.txt", "encrypted_name": "0f0e.enc", "iv": "000102030405060708090a0b"}
            ]
        }"#;

        let manifest = Manifest::from_bytes(doc).unwrap();
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.files[0].iv, [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]);
        assert!(manifest.find("0f0e.enc").is_some());
        assert!(manifest.find("x.txt.enc").is_none());
    }

    #[test]
    fn test_empty_manifest() {
        let manifest = Manifest::new();
        assert!(manifest.is_empty());
        assert_eq!(manifest.to_bytes().unwrap(), br#"{"files":[]}"#);
    }

    #[test]
    fn test_malformed_rejected() {
        let cases: [&[u8]; 5] = [
            b"not json",
            br#"{"entries": []}"#,
            br#"{"files": [{"original_name": "a", "encrypted_name": "a.enc"}]}"#,
            br#"{"files": [{"original_name": "a", "encrypted_name": "a.enc", "iv": "abcd"}]}"#,
            br#"{"files": [{"original_name": "a", "encrypted_name": "a.enc", "iv": "zzzzzzzzzzzzzzzzzzzzzzzz"}]}"#,
        ];

        for doc in cases {
            assert!(matches!(Manifest::from_bytes(doc), Err(Error::ManifestFormat(_))));
        }
    }
}
