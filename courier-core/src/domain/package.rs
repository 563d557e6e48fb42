//! Package domain types

use serde::{Deserialize, Serialize};

/// A versioned archive deployable through an `Archive` step
///
/// The document store keeps metadata only; the body lives in blob storage
/// and is attached when a single package is fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    /// Natural key: `<file_name>:<version>`
    pub id: String,
    pub file_name: String,
    pub content_type: String,
    pub version: String,
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
    #[serde(default, with = "base64_body", skip_serializing_if = "Option::is_none")]
    pub body: Option<Vec<u8>>,
}

impl Package {
    /// Builds the natural key for a file name and version
    pub fn package_id(file_name: &str, version: &str) -> String {
        format!("{}:{}", file_name, version)
    }
}

/// Base64 encoding for package bodies in JSON payloads
mod base64_body {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(body: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        match body {
            Some(bytes) => serializer.serialize_some(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded = Option::<String>::deserialize(deserializer)?;
        encoded
            .map(|value| STANDARD.decode(value).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_id() {
        assert_eq!(
            Package::package_id("somescript.zip", "1.0.1"),
            "somescript.zip:1.0.1"
        );
    }

    #[test]
    fn test_body_travels_as_base64() {
        let package = Package {
            id: Package::package_id("a.zip", "1"),
            file_name: "a.zip".to_string(),
            content_type: "application/zip".to_string(),
            version: "1".to_string(),
            uploaded_at: chrono::Utc::now(),
            body: Some(vec![0x50, 0x4b, 0x03, 0x04]),
        };

        let json = serde_json::to_value(&package).unwrap();
        assert_eq!(json["body"], "UEsDBA==");

        let decoded: Package = serde_json::from_value(json).unwrap();
        assert_eq!(decoded.body, Some(vec![0x50, 0x4b, 0x03, 0x04]));
    }

    #[test]
    fn test_metadata_without_body() {
        let json = serde_json::json!({
            "id": "a.zip:1",
            "file_name": "a.zip",
            "content_type": "application/zip",
            "version": "1",
            "uploaded_at": "2024-01-01T00:00:00Z"
        });

        let package: Package = serde_json::from_value(json).unwrap();
        assert!(package.body.is_none());
        assert!(serde_json::to_value(&package).unwrap().get("body").is_none());
    }
}
