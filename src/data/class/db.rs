use bson::{doc, Document};
use bson::oid::ObjectId;
use chrono::Utc;
use mongodb::results::{DeleteResult, InsertOneResult, UpdateResult};
use mongodb::Database;
use rocket::futures::TryStreamExt;
use serde::Deserialize;
use utoipa::ToSchema;

use super::{new_public_id, Assignment, Class, CLASS_COLLECTION_NAME};
use crate::data::{decode_documents, filter, ApprovalStatus};
use crate::resp::problem::{problems, Problem};
use crate::resp::validated::Validate;

fn validate_listing(title: &str, email: &str, price: f64) -> Result<(), Problem> {
    if title.trim().is_empty() {
        return Err(problems::bad_field("title", "Title is required."));
    }
    if email.trim().is_empty() {
        return Err(problems::bad_field("email", "Owner email is required."));
    }
    if !price.is_finite() || price < 0.0 {
        return Err(problems::bad_field(
            "price",
            "Price must be a non-negative number.",
        ));
    }
    Ok(())
}

/// Body of `POST /classes`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassCreateData {
    pub title: String,
    pub instructor_name: Option<String>,
    #[schema(format = "email")]
    pub email: String,
    pub image: Option<String>,
    #[serde(default)]
    pub price: f64,
    pub seats: Option<u32>,
    #[serde(default)]
    pub description: String,
}

impl Validate for ClassCreateData {
    fn validate(&self) -> Result<(), Problem> {
        validate_listing(&self.title, &self.email, self.price)
    }
}

impl From<ClassCreateData> for Class {
    fn from(data: ClassCreateData) -> Self {
        Class {
            id: None,
            class_id: new_public_id(),
            title: data.title,
            instructor_name: data.instructor_name,
            email: data.email,
            image: data.image,
            price: data.price,
            seats: data.seats,
            description: data.description,
            status: ApprovalStatus::Pending,
            feedback: None,
            total_enrollment: 0,
            assignments: vec![],
            assignment_count: 0,
        }
    }
}

/// Body of `PUT /classes/<id>`. Every listing field is overwritten.
pub type ClassUpdateData = ClassCreateData;

/// Optional body of the class approve/reject routes.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ClassReviewData {
    pub feedback: Option<String>,
}

impl Validate for ClassReviewData {
    fn validate(&self) -> Result<(), Problem> {
        Ok(())
    }
}

/// Body of `PUT /add-assignment/<id>`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AssignmentCreateData {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub deadline: Option<String>,
}

impl Validate for AssignmentCreateData {
    fn validate(&self) -> Result<(), Problem> {
        if self.title.trim().is_empty() {
            return Err(problems::bad_field("title", "Assignment title is required."));
        }
        Ok(())
    }
}

impl From<AssignmentCreateData> for Assignment {
    fn from(data: AssignmentCreateData) -> Self {
        Assignment {
            assignment_id: new_public_id(),
            title: data.title,
            description: data.description,
            deadline: data.deadline,
            created_at: Utc::now(),
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait ClassDbExt {
    async fn list_classes(
        &self,
        status: Option<ApprovalStatus>,
    ) -> mongodb::error::Result<Vec<Class>>;
    async fn list_class_requests(&self) -> mongodb::error::Result<Vec<Class>>;
    async fn list_teacher_classes(
        &self,
        email: impl AsRef<str>,
    ) -> mongodb::error::Result<Vec<Class>>;
    async fn get_class(&self, id: ObjectId) -> mongodb::error::Result<Option<Class>>;

    async fn create_class(&self, data: ClassCreateData) -> mongodb::error::Result<InsertOneResult>;
    async fn update_class(
        &self,
        id: ObjectId,
        data: ClassUpdateData,
    ) -> mongodb::error::Result<UpdateResult>;
    async fn review_class(
        &self,
        id: ObjectId,
        status: ApprovalStatus,
        review: ClassReviewData,
    ) -> mongodb::error::Result<UpdateResult>;
    async fn delete_class(&self, id: ObjectId) -> mongodb::error::Result<DeleteResult>;

    /// Appends an assignment and bumps `assignmentCount` in a single update.
    async fn add_assignment(
        &self,
        id: ObjectId,
        data: AssignmentCreateData,
    ) -> mongodb::error::Result<UpdateResult>;
}

async fn find_classes(db: &Database, filter: Option<Document>) -> mongodb::error::Result<Vec<Class>> {
    let documents: Vec<Document> = db
        .collection::<Document>(CLASS_COLLECTION_NAME)
        .find(filter, None)
        .await?
        .try_collect()
        .await?;

    Ok(decode_documents(CLASS_COLLECTION_NAME, documents))
}

impl ClassDbExt for Database {
    async fn list_classes(
        &self,
        status: Option<ApprovalStatus>,
    ) -> mongodb::error::Result<Vec<Class>> {
        find_classes(self, status.map(filter::by_status)).await
    }

    async fn list_class_requests(&self) -> mongodb::error::Result<Vec<Class>> {
        find_classes(self, Some(filter::with_any_status())).await
    }

    async fn list_teacher_classes(
        &self,
        email: impl AsRef<str>,
    ) -> mongodb::error::Result<Vec<Class>> {
        find_classes(self, Some(filter::by_email(email))).await
    }

    async fn get_class(&self, id: ObjectId) -> mongodb::error::Result<Option<Class>> {
        self.collection::<Class>(CLASS_COLLECTION_NAME)
            .find_one(filter::by_id(id), None)
            .await
    }

    async fn create_class(&self, data: ClassCreateData) -> mongodb::error::Result<InsertOneResult> {
        let class = Class::from(data);
        tracing::info!("Creating class '{}' for {}.", class.title, class.email);

        self.collection::<Class>(CLASS_COLLECTION_NAME)
            .insert_one(&class, None)
            .await
    }

    async fn update_class(
        &self,
        id: ObjectId,
        data: ClassUpdateData,
    ) -> mongodb::error::Result<UpdateResult> {
        let update = doc! {
            "$set": {
                "title": data.title,
                "instructorName": data.instructor_name,
                "email": data.email,
                "image": data.image,
                "price": data.price,
                "seats": data.seats.map(i64::from),
                "description": data.description,
            }
        };

        self.collection::<Class>(CLASS_COLLECTION_NAME)
            .update_one(filter::by_id(id), update, None)
            .await
    }

    async fn review_class(
        &self,
        id: ObjectId,
        status: ApprovalStatus,
        review: ClassReviewData,
    ) -> mongodb::error::Result<UpdateResult> {
        let mut set = doc! { "status": status };
        if let Some(feedback) = review.feedback {
            set.insert("feedback", feedback);
        }

        self.collection::<Class>(CLASS_COLLECTION_NAME)
            .update_one(filter::by_id(id), doc! { "$set": set }, None)
            .await
    }

    async fn delete_class(&self, id: ObjectId) -> mongodb::error::Result<DeleteResult> {
        self.collection::<Class>(CLASS_COLLECTION_NAME)
            .delete_one(filter::by_id(id), None)
            .await
    }

    async fn add_assignment(
        &self,
        id: ObjectId,
        data: AssignmentCreateData,
    ) -> mongodb::error::Result<UpdateResult> {
        let assignment = bson::to_bson(&Assignment::from(data))?;

        self.collection::<Class>(CLASS_COLLECTION_NAME)
            .update_one(
                filter::by_id(id),
                doc! {
                    "$push": { "assignments": assignment },
                    "$inc": { "assignmentCount": 1 },
                },
                None,
            )
            .await
    }
}
