use bson::oid::ObjectId;
use bson::{Bson, Document};
use serde_json::Value;
use utoipa::ToSchema;

use crate::data::ApprovalStatus;
use crate::role::Role;

pub mod db;

pub static USER_COLLECTION_NAME: &str = "users";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default)]
    pub role: Role,
    /// Only present once the user applied to teach.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ApprovalStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_req_data: Option<Document>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub email: String,
    pub name: Option<String>,
    pub photo: Option<String>,
    pub role: Role,
    pub status: Option<ApprovalStatus>,
    #[schema(value_type = Option<Object>)]
    pub teacher_req_data: Option<Value>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id.map(|id| id.to_hex()),
            email: user.email,
            name: user.name,
            photo: user.photo,
            role: user.role,
            status: user.status,
            teacher_req_data: user
                .teacher_req_data
                .map(|data| Bson::Document(data).into_relaxed_extjson()),
        }
    }
}
