use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

// =============================================================================
// Fly Analysis Result (model output contract)
// =============================================================================

/// Structured identification returned by the vision model.
///
/// Field names follow the camelCase JSON schema the model is instructed to
/// emit, so the completion text deserializes directly into this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlyAnalysisResult {
    /// Identification block.
    pub fly_identification: FlyIdentification,
    /// Usage and context narrative.
    pub description: String,
    /// Materials followed by numbered tying steps, in order.
    pub mounting_instructions: Vec<String>,
}

/// Identification of the artificial fly and the insect it imitates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlyIdentification {
    /// Common or commercial name of the artificial fly.
    #[serde(default, deserialize_with = "null_as_default")]
    pub common_name: String,
    /// Taxonomic chain of the imitated insect.
    pub imitated_insect: ImitatedInsect,
    /// Similar species or genera considered and discarded.
    #[serde(default, deserialize_with = "null_as_default")]
    pub similar_species_discarded: Vec<String>,
    /// Self-reported confidence in [0, 1].
    pub confidence: f64,
}

/// Order → family → genus → species chain. Levels are best-effort.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImitatedInsect {
    #[serde(default, deserialize_with = "null_as_default")]
    pub order: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub family: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genus: String,
    /// Latin species name, absent when the model is not sure.
    #[serde(default)]
    pub species: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl FlyAnalysisResult {
    /// Parse the model's completion text.
    ///
    /// Either the whole result is returned or `MalformedResult`; a partially
    /// populated value never escapes.
    pub fn from_completion(content: &str) -> Result<Self> {
        let result: Self = serde_json::from_str(content)
            .map_err(|e| Error::malformed_result(format!("invalid JSON payload: {}", e)))?;
        result.validate()?;
        Ok(result)
    }

    /// Checks the parts of the contract the type system cannot.
    pub fn validate(&self) -> Result<()> {
        let confidence = self.confidence();
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(Error::malformed_result(format!(
                "confidence {} outside [0, 1]",
                confidence
            )));
        }
        if self.mounting_instructions.is_empty() {
            return Err(Error::malformed_result("mountingInstructions is empty"));
        }
        Ok(())
    }

    /// Shortcut for `fly_identification.confidence`.
    pub fn confidence(&self) -> f64 {
        self.fly_identification.confidence
    }

    /// Whether this result should be stored. Strictly greater than `threshold`.
    pub fn should_persist(&self, threshold: f64) -> bool {
        self.confidence() > threshold
    }

    /// Non-empty values among order, family and common name, in that order.
    pub fn search_tags(&self) -> Vec<String> {
        let id = &self.fly_identification;
        [
            id.imitated_insect.order.as_str(),
            id.imitated_insect.family.as_str(),
            id.common_name.as_str(),
        ]
        .into_iter()
        .filter(|tag| !tag.trim().is_empty())
        .map(String::from)
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(order: &str, family: &str, common_name: &str, confidence: f64) -> FlyAnalysisResult {
        FlyAnalysisResult {
            fly_identification: FlyIdentification {
                common_name: common_name.to_string(),
                imitated_insect: ImitatedInsect {
                    order: order.to_string(),
                    family: family.to_string(),
                    genus: "Baetis".to_string(),
                    species: None,
                },
                similar_species_discarded: vec![],
                confidence,
            },
            description: "Ninfa de efímera".to_string(),
            mounting_instructions: vec!["Anzuelo del 16".to_string()],
        }
    }

    #[test]
    fn test_search_tags_skip_empty_fields() {
        let result = sample("Ephemeroptera", "Baetidae", "", 0.9);
        assert_eq!(result.search_tags(), vec!["Ephemeroptera", "Baetidae"]);
    }

    #[test]
    fn test_search_tags_keep_order() {
        let result = sample("", "Baetidae", "Olive Dun", 0.9);
        assert_eq!(result.search_tags(), vec!["Baetidae", "Olive Dun"]);
    }

    #[test]
    fn test_should_persist_is_strict() {
        assert!(!sample("a", "b", "c", 0.4).should_persist(0.4));
        assert!(sample("a", "b", "c", 0.40000001).should_persist(0.4));
        assert!(!sample("a", "b", "c", 0.1).should_persist(0.4));
    }

    #[test]
    fn test_from_completion_parses_schema() {
        let content = r#"{
            "flyIdentification": {
                "commonName": "Pardón",
                "imitatedInsect": {
                    "order": "Ephemeroptera",
                    "family": "Heptageniidae",
                    "genus": "Rhithrogena",
                    "species": null
                },
                "similarSpeciesDiscarded": ["Epeorus"],
                "confidence": 0.72
            },
            "description": "Mosca ahogada leonesa para primavera.",
            "mountingInstructions": ["Materiales: pluma de gallo de León", "Paso 1: Cercos"]
        }"#;
        let result = FlyAnalysisResult::from_completion(content).unwrap();
        assert_eq!(result.fly_identification.common_name, "Pardón");
        assert_eq!(result.fly_identification.imitated_insect.species, None);
        assert_eq!(result.mounting_instructions.len(), 2);
        assert!((result.confidence() - 0.72).abs() < f64::EPSILON);
    }

    #[test]
    fn test_from_completion_null_taxonomy_levels() {
        let content = r#"{
            "flyIdentification": {
                "commonName": null,
                "imitatedInsect": {"order": null, "family": null, "genus": null},
                "confidence": 0.1
            },
            "description": "No es una mosca de pesca.",
            "mountingInstructions": ["No aplica"]
        }"#;
        let result = FlyAnalysisResult::from_completion(content).unwrap();
        assert!(result.search_tags().is_empty());
        assert!(result.fly_identification.similar_species_discarded.is_empty());
    }

    #[test]
    fn test_from_completion_null_discarded_list() {
        let content = r#"{
            "flyIdentification": {
                "commonName": "Pheasant Tail",
                "imitatedInsect": {"order": "Ephemeroptera", "family": "Baetidae", "genus": "Baetis"},
                "similarSpeciesDiscarded": null,
                "confidence": 0.6
            },
            "description": "Ninfa clásica.",
            "mountingInstructions": ["Materiales: anzuelo del 16, fibras de faisán"]
        }"#;
        let result = FlyAnalysisResult::from_completion(content).unwrap();
        assert!(result.fly_identification.similar_species_discarded.is_empty());
        assert_eq!(result.search_tags(), vec!["Ephemeroptera", "Baetidae", "Pheasant Tail"]);
    }

    #[test]
    fn test_from_completion_rejects_bad_payloads() {
        for content in [
            "not json",
            "{\"description\": \"missing identification\"}",
            r#"{"flyIdentification":{"commonName":"x","imitatedInsect":{},"confidence":1.7},"description":"","mountingInstructions":["a"]}"#,
            r#"{"flyIdentification":{"commonName":"x","imitatedInsect":{},"confidence":0.5},"description":"","mountingInstructions":[]}"#,
        ] {
            let err = FlyAnalysisResult::from_completion(content).unwrap_err();
            assert!(matches!(err, Error::MalformedResult(_)), "{content}");
        }
    }
}
