use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::analysis::FlyAnalysisResult;

/// Store-assigned identifier of a catch record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    /// Fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Record contents before the store assigns `id` and `createdAt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCatchRecord {
    /// The accepted analysis.
    #[serde(flatten)]
    pub analysis: FlyAnalysisResult,
    /// Download URL of the uploaded image. Empty when the upload failed.
    pub image_url: String,
    /// Local reference the image was captured from.
    pub local_image_uri: String,
    /// Owning user.
    pub user_id: String,
    /// Non-empty taxonomy/name strings for search.
    pub search_tags: Vec<String>,
}

impl NewCatchRecord {
    /// Build a record, deriving the search tags from the analysis.
    pub fn new(
        analysis: FlyAnalysisResult,
        image_url: impl Into<String>,
        local_image_uri: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        let search_tags = analysis.search_tags();
        Self {
            analysis,
            image_url: image_url.into(),
            local_image_uri: local_image_uri.into(),
            user_id: user_id.into(),
            search_tags,
        }
    }

    /// Finalize with the store-assigned fields.
    pub fn into_record(self, id: RecordId, created_at: DateTime<Utc>) -> CatchRecord {
        CatchRecord {
            id,
            created_at,
            record: self,
        }
    }
}

/// A persisted history entry. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatchRecord {
    pub id: RecordId,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub record: NewCatchRecord,
}

impl CatchRecord {
    /// Remote image URL, `None` if the upload did not succeed.
    pub fn image_url(&self) -> Option<&str> {
        Some(self.record.image_url.as_str()).filter(|u| !u.is_empty())
    }

    pub fn user_id(&self) -> &str {
        &self.record.user_id
    }

    pub fn analysis(&self) -> &FlyAnalysisResult {
        &self.record.analysis
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FlyIdentification, ImitatedInsect};

    #[test]
    fn test_record_serializes_flat() {
        let analysis = FlyAnalysisResult {
            fly_identification: FlyIdentification {
                common_name: "Tricóptero de cabeza dorada".into(),
                imitated_insect: ImitatedInsect {
                    order: "Trichoptera".into(),
                    family: "Hydropsychidae".into(),
                    genus: "Hydropsyche".into(),
                    species: None,
                },
                similar_species_discarded: vec![],
                confidence: 0.8,
            },
            description: "Ninfa lastrada".into(),
            mounting_instructions: vec!["Paso 1: Lastrar".into()],
        };
        let record = NewCatchRecord::new(analysis, "", "/tmp/a.jpg", "user-1")
            .into_record(RecordId("rec-1".into()), Utc::now());

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], "rec-1");
        assert_eq!(json["userId"], "user-1");
        assert_eq!(json["localImageUri"], "/tmp/a.jpg");
        assert_eq!(json["flyIdentification"]["imitatedInsect"]["family"], "Hydropsychidae");
        assert_eq!(json["searchTags"], serde_json::json!(["Trichoptera", "Hydropsychidae", "Tricóptero de cabeza dorada"]));
        assert_eq!(record.image_url(), None);

        let back: CatchRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
