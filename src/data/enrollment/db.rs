use bson::Document;
use chrono::{DateTime, Utc};
use mongodb::results::InsertOneResult;
use mongodb::Database;
use rocket::futures::TryStreamExt;
use serde::Deserialize;
use utoipa::ToSchema;

use super::{Enrollment, ENROLLMENT_COLLECTION_NAME};
use crate::data::{decode_documents, filter, parse_id};
use crate::resp::problem::{problems, Problem};
use crate::resp::validated::Validate;

/// Body of `POST /enroll`, sent after the payment was confirmed client side.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrollData {
    #[schema(format = "email")]
    pub email: String,
    /// `_id` of the enrolled class.
    pub class_id: String,
    pub class_title: Option<String>,
    #[serde(default)]
    pub price: f64,
    pub transaction_id: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

impl Validate for EnrollData {
    fn validate(&self) -> Result<(), Problem> {
        if self.email.trim().is_empty() {
            return Err(problems::bad_field("email", "Email is required."));
        }
        parse_id(&self.class_id)
            .map_err(|_| problems::bad_field("classId", "Class id must be an ObjectId."))?;
        Ok(())
    }
}

impl From<EnrollData> for Enrollment {
    fn from(data: EnrollData) -> Self {
        Enrollment {
            id: None,
            email: data.email,
            class_id: data.class_id,
            class_title: data.class_title,
            price: data.price,
            transaction_id: data.transaction_id,
            date: data.date.unwrap_or_else(Utc::now),
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait EnrollmentDbExt {
    async fn enroll(&self, data: EnrollData) -> mongodb::error::Result<InsertOneResult>;
    async fn list_enrollments(
        &self,
        email: impl AsRef<str>,
    ) -> mongodb::error::Result<Vec<Enrollment>>;
}

impl EnrollmentDbExt for Database {
    async fn enroll(&self, data: EnrollData) -> mongodb::error::Result<InsertOneResult> {
        let enrollment = Enrollment::from(data);
        tracing::info!(
            "Enrolling {} into class {}.",
            enrollment.email,
            enrollment.class_id
        );

        self.collection::<Enrollment>(ENROLLMENT_COLLECTION_NAME)
            .insert_one(&enrollment, None)
            .await
    }

    async fn list_enrollments(
        &self,
        email: impl AsRef<str>,
    ) -> mongodb::error::Result<Vec<Enrollment>> {
        let documents: Vec<Document> = self
            .collection::<Document>(ENROLLMENT_COLLECTION_NAME)
            .find(filter::by_email(email), None)
            .await?
            .try_collect()
            .await?;

        Ok(decode_documents(ENROLLMENT_COLLECTION_NAME, documents))
    }
}
