use bson::oid::ObjectId;
use bson::{doc, Bson, Document};
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use mongodb::results::UpdateResult;
use mongodb::Database;
use rocket::futures::TryStreamExt;
use utoipa::ToSchema;

use super::{User, USER_COLLECTION_NAME};
use crate::data::{filter, ApprovalStatus};
use crate::resp::problem::{problems, Problem};
use crate::resp::validated::Validate;
use crate::role::Role;

/// Body of `PUT /user`, sent on every login and on teacher applications.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserUpsertData {
    #[schema(format = "email")]
    pub email: String,
    pub name: Option<String>,
    pub photo: Option<String>,
    pub status: Option<ApprovalStatus>,
    #[schema(value_type = Option<Object>)]
    pub teacher_req_data: Option<Document>,
}

impl Validate for UserUpsertData {
    fn validate(&self) -> Result<(), Problem> {
        if self.email.trim().is_empty() {
            return Err(problems::bad_field("email", "Email is required."));
        }
        Ok(())
    }
}

impl From<UserUpsertData> for User {
    fn from(data: UserUpsertData) -> Self {
        User {
            id: None,
            email: data.email,
            name: data.name,
            photo: data.photo,
            role: Role::Student,
            status: data.status,
            teacher_req_data: data.teacher_req_data,
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait UserDbExt {
    async fn list_users(&self) -> mongodb::error::Result<Vec<User>>;
    async fn list_teacher_requests(&self) -> mongodb::error::Result<Vec<User>>;

    async fn find_user_by_email(&self, email: impl AsRef<str>)
        -> mongodb::error::Result<Option<User>>;

    /// Inserts a user on first login, otherwise records a pending teacher
    /// application or returns the stored user unchanged.
    async fn upsert_user(&self, data: UserUpsertData) -> mongodb::error::Result<User>;

    async fn approve_teacher(&self, id: ObjectId) -> mongodb::error::Result<UpdateResult>;
    async fn reject_teacher(&self, id: ObjectId) -> mongodb::error::Result<UpdateResult>;
    async fn make_admin(&self, id: ObjectId) -> mongodb::error::Result<UpdateResult>;
}

impl UserDbExt for Database {
    async fn list_users(&self) -> mongodb::error::Result<Vec<User>> {
        self.collection::<User>(USER_COLLECTION_NAME)
            .find(None, None)
            .await?
            .try_collect()
            .await
    }

    async fn list_teacher_requests(&self) -> mongodb::error::Result<Vec<User>> {
        self.collection::<User>(USER_COLLECTION_NAME)
            .find(filter::with_any_status(), None)
            .await?
            .try_collect()
            .await
    }

    async fn find_user_by_email(
        &self,
        email: impl AsRef<str>,
    ) -> mongodb::error::Result<Option<User>> {
        self.collection::<User>(USER_COLLECTION_NAME)
            .find_one(filter::by_email(email), None)
            .await
    }

    async fn upsert_user(&self, data: UserUpsertData) -> mongodb::error::Result<User> {
        let users = self.collection::<User>(USER_COLLECTION_NAME);

        let existing = match users.find_one(filter::by_email(&data.email), None).await? {
            Some(existing) => existing,
            None => {
                let mut user = User::from(data);
                let inserted = users.insert_one(&user, None).await?;
                user.id = inserted.inserted_id.as_object_id();
                tracing::info!("Created user '{}'.", user.email);
                return Ok(user);
            }
        };

        if data.status != Some(ApprovalStatus::Pending) {
            return Ok(existing);
        }

        let teacher_req_data = data
            .teacher_req_data
            .map(Bson::Document)
            .unwrap_or(Bson::Null);
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        let updated = users
            .find_one_and_update(
                filter::by_email(&data.email),
                doc! {
                    "$set": {
                        "status": ApprovalStatus::Pending,
                        "teacherReqData": teacher_req_data,
                    }
                },
                options,
            )
            .await?;
        tracing::info!("User '{}' applied to teach.", data.email);

        Ok(updated.unwrap_or(existing))
    }

    async fn approve_teacher(&self, id: ObjectId) -> mongodb::error::Result<UpdateResult> {
        self.collection::<User>(USER_COLLECTION_NAME)
            .update_one(
                filter::by_id(id),
                doc! { "$set": { "role": Role::Teacher, "status": ApprovalStatus::Accepted } },
                None,
            )
            .await
    }

    async fn reject_teacher(&self, id: ObjectId) -> mongodb::error::Result<UpdateResult> {
        self.collection::<User>(USER_COLLECTION_NAME)
            .update_one(
                filter::by_id(id),
                doc! { "$set": { "status": ApprovalStatus::Rejected } },
                None,
            )
            .await
    }

    async fn make_admin(&self, id: ObjectId) -> mongodb::error::Result<UpdateResult> {
        self.collection::<User>(USER_COLLECTION_NAME)
            .update_one(filter::by_id(id), doc! { "$set": { "role": Role::Admin } }, None)
            .await
    }
}
