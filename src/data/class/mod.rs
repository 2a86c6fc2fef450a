use bson::oid::ObjectId;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::data::{lenient, ApprovalStatus};

pub mod db;

pub static CLASS_COLLECTION_NAME: &str = "classes";

fn new_public_id() -> String {
    Uuid::new_v4().to_string()
}

/// Stored assignment. Generated on append, never edited.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    #[serde(default)]
    pub assignment_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(
        default = "Utc::now",
        serialize_with = "chrono_datetime_as_bson_datetime::serialize",
        deserialize_with = "lenient::datetime"
    )]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Client facing identifier. Documents without one expose their `_id`.
    #[serde(default)]
    pub class_id: String,

    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub instructor_name: Option<String>,
    /// Owning teacher.
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "lenient::price")]
    pub price: f64,
    #[serde(default)]
    pub seats: Option<u32>,
    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub status: ApprovalStatus,
    #[serde(default)]
    pub feedback: Option<String>,

    #[serde(default)]
    pub total_enrollment: u32,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
    #[serde(default)]
    pub assignment_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentResponse {
    pub assignment_id: String,
    pub title: String,
    pub description: String,
    pub deadline: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassResponse {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub class_id: String,
    pub title: String,
    pub instructor_name: Option<String>,
    pub email: String,
    pub image: Option<String>,
    pub price: f64,
    pub seats: Option<u32>,
    pub description: String,
    pub status: ApprovalStatus,
    pub feedback: Option<String>,
    pub total_enrollment: u32,
    pub assignments: Vec<AssignmentResponse>,
    pub assignment_count: u32,
}

impl From<Class> for ClassResponse {
    fn from(class: Class) -> Self {
        let id = class.id.map(|id| id.to_hex());
        let base_id = id.clone().unwrap_or_default();

        let class_id = if class.class_id.is_empty() {
            base_id.clone()
        } else {
            class.class_id
        };

        // Assignments are only ever appended, so the position is stable.
        let assignments = class
            .assignments
            .into_iter()
            .enumerate()
            .map(|(i, assignment)| AssignmentResponse {
                assignment_id: if assignment.assignment_id.is_empty() {
                    format!("{}-{}", base_id, i)
                } else {
                    assignment.assignment_id
                },
                title: assignment.title,
                description: assignment.description,
                deadline: assignment.deadline,
                created_at: assignment.created_at,
            })
            .collect();

        ClassResponse {
            id,
            class_id,
            title: class.title,
            instructor_name: class.instructor_name,
            email: class.email,
            image: class.image,
            price: class.price,
            seats: class.seats,
            description: class.description,
            status: class.status,
            feedback: class.feedback,
            total_enrollment: class.total_enrollment,
            assignments,
            assignment_count: class.assignment_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn legacy_class_documents_get_defaults() {
        let id = ObjectId::new();
        let class: Class = bson::from_document(doc! {
            "_id": id,
            "title": "Intro to Rust",
            "email": "teacher@example.com",
            "price": "25",
        })
        .expect("class document");

        assert_eq!(class.status, ApprovalStatus::Pending);
        assert_eq!(class.price, 25.0);
        assert!(class.assignments.is_empty());
        assert_eq!(class.assignment_count, 0);
        assert_eq!(class.total_enrollment, 0);

        let first = ClassResponse::from(class.clone());
        let second = ClassResponse::from(class);
        assert_eq!(first.class_id, id.to_hex());
        assert_eq!(first.class_id, second.class_id);
    }

    #[test]
    fn legacy_assignment_ids_are_stable() {
        let id = ObjectId::new();
        let class: Class = bson::from_document(doc! {
            "_id": id,
            "title": "Geometry",
            "email": "euclid@example.com",
            "status": "Accepted",
            "assignments": [
                { "title": "Triangles", "createdAt": "2024-03-01T10:00:00Z" },
                { "assignmentId": "a-1", "title": "Circles", "createdAt": bson::DateTime::now() },
            ],
            "assignmentCount": 2,
        })
        .expect("class document");

        let response = ClassResponse::from(class.clone());
        assert_eq!(response.assignments[0].assignment_id, format!("{}-0", id.to_hex()));
        assert_eq!(response.assignments[1].assignment_id, "a-1");
        assert_eq!(
            ClassResponse::from(class).assignments[0].assignment_id,
            response.assignments[0].assignment_id
        );
    }

    #[test]
    fn assignment_dates_are_stored_as_bson_dates() {
        let assignment = Assignment {
            assignment_id: new_public_id(),
            title: "Homework".to_string(),
            description: String::new(),
            deadline: None,
            created_at: Utc::now(),
        };

        let document = bson::to_document(&assignment).expect("assignment document");
        assert!(matches!(document.get("createdAt"), Some(bson::Bson::DateTime(_))));
    }

    #[test]
    fn response_uses_camel_case() {
        let id = ObjectId::new();
        let class: Class = bson::from_document(doc! {
            "_id": id,
            "classId": "c-1",
            "title": "Geometry",
            "instructorName": "Euclid",
            "email": "euclid@example.com",
            "price": 25.5,
            "status": "Pending",
            "assignmentCount": 0,
        })
        .expect("class document");

        let json = serde_json::to_value(ClassResponse::from(class)).unwrap();
        assert_eq!(json["_id"], id.to_hex());
        assert_eq!(json["classId"], "c-1");
        assert_eq!(json["instructorName"], "Euclid");
        assert_eq!(json["assignmentCount"], 0);
        assert_eq!(json["status"], "Pending");
    }
}
