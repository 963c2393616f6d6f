//! Structured research answer

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Sentence the model must emit when the context cannot answer the question
pub const INSUFFICIENT_EVIDENCE: &str = "The provided documents do not contain sufficient information.";

/// Schema-validated answer returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchAnswer {
    /// Direct answer to the research question
    #[serde(alias = "answerr")]
    pub answer: String,

    /// Key supporting points
    pub key_points: Vec<String>,

    /// Paper-wise evidence keyed by paper name
    #[serde(deserialize_with = "unique_keys")]
    pub evidence: BTreeMap<String, String>,

    /// Limitations or uncertainties
    pub limitations: String,

    /// Cited papers
    pub references: Vec<String>,
}

impl ResearchAnswer {
    /// The answer returned when retrieval produced no usable evidence
    pub fn insufficient_evidence() -> Self {
        Self {
            answer: INSUFFICIENT_EVIDENCE.to_string(),
            key_points: Vec::new(),
            evidence: BTreeMap::new(),
            limitations: "No relevant passages were retrieved from the corpus.".to_string(),
            references: Vec::new(),
        }
    }

    pub fn is_insufficient(&self) -> bool {
        self.answer.trim() == INSUFFICIENT_EVIDENCE
    }
}

/// Reject JSON objects that repeat a key instead of silently keeping the last value
fn unique_keys<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct UniqueKeys;

    impl<'de> Visitor<'de> for UniqueKeys {
        type Value = BTreeMap<String, String>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an object mapping paper names to evidence strings")
        }

        fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut map = BTreeMap::new();
            while let Some((key, value)) = access.next_entry::<String, String>()? {
                if map.contains_key(&key) {
                    return Err(de::Error::custom(format!("duplicate evidence key `{}`", key)));
                }
                map.insert(key, value);
            }
            Ok(map)
        }
    }

    deserializer.deserialize_map(UniqueKeys)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_answerr_alias() {
        let json = r#"{
            "answerr": "ResNet",
            "key_points": [],
            "evidence": {},
            "limitations": "",
            "references": []
        }"#;
        let answer: ResearchAnswer = serde_json::from_str(json).unwrap();
        assert_eq!(answer.answer, "ResNet");
    }

    #[test]
    fn test_duplicate_evidence_keys_rejected() {
        let json = r#"{
            "answer": "x",
            "key_points": [],
            "evidence": {"a.pdf": "one", "a.pdf": "two"},
            "limitations": "",
            "references": []
        }"#;
        let err = serde_json::from_str::<ResearchAnswer>(json).unwrap_err();
        assert!(err.to_string().contains("duplicate evidence key"));
    }

    #[test]
    fn test_missing_field_rejected() {
        let json = r#"{"answer": "x", "key_points": [], "evidence": {}}"#;
        assert!(serde_json::from_str::<ResearchAnswer>(json).is_err());
    }

    #[test]
    fn test_insufficient_evidence_shape() {
        let answer = ResearchAnswer::insufficient_evidence();
        assert!(answer.is_insufficient());
        assert!(answer.evidence.is_empty());
        assert!(answer.key_points.is_empty());
    }
}
