use bson::oid::ObjectId;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::data::lenient;

pub mod db;

pub static ENROLLMENT_COLLECTION_NAME: &str = "enrollments";

/// A paid seat in a class. Enrollments are never updated or removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub email: String,
    pub class_id: String,
    #[serde(default)]
    pub class_title: Option<String>,
    #[serde(default, deserialize_with = "lenient::price")]
    pub price: f64,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(
        default = "Utc::now",
        serialize_with = "chrono_datetime_as_bson_datetime::serialize",
        deserialize_with = "lenient::datetime"
    )]
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentResponse {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub email: String,
    pub class_id: String,
    pub class_title: Option<String>,
    pub price: f64,
    pub transaction_id: Option<String>,
    pub date: DateTime<Utc>,
}

impl From<Enrollment> for EnrollmentResponse {
    fn from(enrollment: Enrollment) -> Self {
        EnrollmentResponse {
            id: enrollment.id.map(|id| id.to_hex()),
            email: enrollment.email,
            class_id: enrollment.class_id,
            class_title: enrollment.class_title,
            price: enrollment.price,
            transaction_id: enrollment.transaction_id,
            date: enrollment.date,
        }
    }
}
