// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use serde::{Deserialize, Serialize};

/// What a store hands back for a fetch: the blob plus the material needed to
/// prove it was committed.
///
/// The serde form is the gateway's JSON envelope, with every field standard
/// base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertifiedBlock {
    #[serde(with = "base64_bytes")]
    pub certificate: Vec<u8>,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    #[serde(with = "base64_bytes")]
    pub witness: Vec<u8>,
}

/// Serde adapter for byte fields carried as standard base64 strings.
pub mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD
            .decode(text.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_json_form() {
        let block = CertifiedBlock {
            certificate: vec![0xd9, 0xd9, 0xf7],
            data: b"Test-Data".to_vec(),
            witness: vec![],
        };
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["certificate"], "2dn3");
        assert_eq!(json["data"], "VGVzdC1EYXRh");
        assert_eq!(json["witness"], "");

        let back: CertifiedBlock = serde_json::from_value(json).unwrap();
        assert_eq!(back, block);
    }

    #[test]
    fn test_rejects_non_base64() {
        let err = serde_json::from_str::<CertifiedBlock>(
            r#"{"certificate":"!!","data":"","witness":""}"#,
        );
        assert!(err.is_err());
    }
}
