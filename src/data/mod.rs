use bson::oid::ObjectId;
use bson::{doc, Bson, Document};
use mongodb::results::{DeleteResult, InsertOneResult, UpdateResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::resp::problem::{problems, Problem};

pub mod class;
pub mod enrollment;
pub mod user;

/// Review state shared by teacher applications and classes.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ApprovalStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl ApprovalStatus {
    pub const ALL: [ApprovalStatus; 3] = [
        ApprovalStatus::Pending,
        ApprovalStatus::Rejected,
        ApprovalStatus::Accepted,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "Pending",
            ApprovalStatus::Accepted => "Accepted",
            ApprovalStatus::Rejected => "Rejected",
        }
    }
}

impl From<ApprovalStatus> for Bson {
    fn from(status: ApprovalStatus) -> Self {
        Bson::String(status.as_str().to_string())
    }
}

pub mod filter {
    use super::*;

    #[inline]
    pub fn by_id(id: ObjectId) -> Document {
        doc! { "_id": id }
    }

    #[inline]
    pub fn by_email(email: impl AsRef<str>) -> Document {
        doc! { "email": email.as_ref() }
    }

    #[inline]
    pub fn by_status(status: ApprovalStatus) -> Document {
        doc! { "status": status }
    }

    /// Matches documents that went through review in any state.
    #[inline]
    pub fn with_any_status() -> Document {
        let statuses: Vec<Bson> = ApprovalStatus::ALL.iter().map(|s| Bson::from(*s)).collect();
        doc! { "status": { "$in": statuses } }
    }
}

/// Parses a path segment into a store-assigned document id.
pub fn parse_id(id: &str) -> Result<ObjectId, Problem> {
    ObjectId::parse_str(id).map_err(|_| problems::invalid_id(id))
}

/// Decodes stored documents one by one, skipping (and logging) the ones that
/// don't fit `T` so a single malformed record can't fail a whole listing.
pub fn decode_documents<T: DeserializeOwned>(collection: &str, documents: Vec<Document>) -> Vec<T> {
    documents
        .into_iter()
        .filter_map(|document| {
            let id = document.get("_id").map(bson_id_to_string);
            match bson::from_document(document) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!(
                        "Skipping malformed document {} in '{}': {}",
                        id.unwrap_or_default(),
                        collection,
                        e
                    );
                    None
                }
            }
        })
        .collect()
}

/// Deserializers for fields older clients wrote with loose types.
pub mod lenient {
    use bson::Bson;
    use chrono::{DateTime, Utc};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    /// Accepts any BSON number or a numeric string. `null` reads as zero.
    pub fn price<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Bson::deserialize(deserializer)? {
            Bson::Double(value) => Ok(value),
            Bson::Int32(value) => Ok(value.into()),
            Bson::Int64(value) => Ok(value as f64),
            Bson::String(value) => value
                .trim()
                .parse()
                .map_err(|_| D::Error::custom(format!("price '{}' is not a number", value))),
            Bson::Null => Ok(0.0),
            other => Err(D::Error::custom(format!("price can't be {}", other))),
        }
    }

    /// Accepts a BSON date or an RFC 3339 string.
    pub fn datetime<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        match Bson::deserialize(deserializer)? {
            Bson::DateTime(value) => Ok(value.to_chrono()),
            Bson::String(value) => DateTime::parse_from_rfc3339(&value)
                .map(|it| it.with_timezone(&Utc))
                .map_err(D::Error::custom),
            other => Err(D::Error::custom(format!("expected a date, found {}", other))),
        }
    }
}

fn bson_id_to_string(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsertResponse {
    pub acknowledged: bool,
    pub inserted_id: String,
}

impl From<InsertOneResult> for InsertResponse {
    fn from(result: InsertOneResult) -> Self {
        InsertResponse {
            acknowledged: true,
            inserted_id: bson_id_to_string(&result.inserted_id),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResponse {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_id: Option<String>,
}

impl From<UpdateResult> for UpdateResponse {
    fn from(result: UpdateResult) -> Self {
        UpdateResponse {
            acknowledged: true,
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_id: result.upserted_id.as_ref().map(bson_id_to_string),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl From<DeleteResult> for DeleteResponse {
    fn from(result: DeleteResult) -> Self {
        DeleteResponse {
            acknowledged: true,
            deleted_count: result.deleted_count,
        }
    }
}
