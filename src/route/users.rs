use rocket::serde::json::Json;
use rocket::State;

use crate::data::parse_id;
use crate::data::user::db::{UserDbExt, UserUpsertData};
use crate::data::user::UserResponse;
use crate::data::UpdateResponse;
use crate::resp::problem::Problem;
use crate::resp::validated::Validated;
use crate::store::Store;

fn user_responses(users: Vec<crate::data::user::User>) -> Json<Vec<UserResponse>> {
    Json(users.into_iter().map(UserResponse::from).collect())
}

/// List all users
#[utoipa::path(
    responses(
        (status = 200, description = "Every user", body = [UserResponse]),
    )
)]
#[get("/users")]
#[tracing::instrument(skip(store))]
pub async fn user_list(store: &State<Store>) -> Result<Json<Vec<UserResponse>>, Problem> {
    Ok(user_responses(store.list_users().await?))
}

/// List users that applied to teach, in any review state
#[utoipa::path(
    responses(
        (status = 200, description = "Teacher applicants", body = [UserResponse]),
    )
)]
#[get("/teacher-requests")]
#[tracing::instrument(skip(store))]
pub async fn teacher_requests(store: &State<Store>) -> Result<Json<Vec<UserResponse>>, Problem> {
    Ok(user_responses(store.list_teacher_requests().await?))
}

/// Get a user by email
#[utoipa::path(
    params(
        ("email", description = "user email")
    ),
    responses(
        (status = 200, description = "The user, or null if none exists", body = UserResponse),
    )
)]
#[get("/user/<email>")]
#[tracing::instrument(skip(store))]
pub async fn user_get(
    email: &str,
    store: &State<Store>,
) -> Result<Json<Option<UserResponse>>, Problem> {
    let user = store.find_user_by_email(email).await?;
    Ok(Json(user.map(UserResponse::from)))
}

/// Record a login or a teacher application
///
/// Unknown emails are inserted. Known users are only changed when the body
/// carries `status: "Pending"`, in which case the application payload is
/// replaced.
#[utoipa::path(
    request_body = UserUpsertData,
    responses(
        (status = 200, description = "Stored user", body = UserResponse),
        (status = 400, description = "Missing email", body = Problem),
        (status = 409, description = "Concurrent first login for the same email", body = Problem),
    )
)]
#[put("/user", data = "<user>")]
#[tracing::instrument(skip(store))]
pub async fn user_upsert(
    user: Result<Validated<UserUpsertData>, Problem>,
    store: &State<Store>,
) -> Result<Json<UserResponse>, Problem> {
    let user = store.upsert_user(user?.into_inner()).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Accept a teacher application
#[utoipa::path(
    params(
        ("id", description = "user ObjectId")
    ),
    responses(
        (status = 200, description = "Update result", body = UpdateResponse),
        (status = 400, description = "Malformed id", body = Problem),
    )
)]
#[patch("/teacher-approve/<id>")]
#[tracing::instrument(skip(store))]
pub async fn teacher_approve(id: &str, store: &State<Store>) -> Result<Json<UpdateResponse>, Problem> {
    let result = store.approve_teacher(parse_id(id)?).await?;
    Ok(Json(result.into()))
}

/// Reject a teacher application
#[utoipa::path(
    params(
        ("id", description = "user ObjectId")
    ),
    responses(
        (status = 200, description = "Update result", body = UpdateResponse),
        (status = 400, description = "Malformed id", body = Problem),
    )
)]
#[patch("/teacher-reject/<id>")]
#[tracing::instrument(skip(store))]
pub async fn teacher_reject(id: &str, store: &State<Store>) -> Result<Json<UpdateResponse>, Problem> {
    let result = store.reject_teacher(parse_id(id)?).await?;
    Ok(Json(result.into()))
}

/// Grant a user the admin role
#[utoipa::path(
    params(
        ("id", description = "user ObjectId")
    ),
    responses(
        (status = 200, description = "Update result", body = UpdateResponse),
        (status = 400, description = "Malformed id", body = Problem),
    )
)]
#[patch("/user/<id>")]
#[tracing::instrument(skip(store))]
pub async fn user_make_admin(id: &str, store: &State<Store>) -> Result<Json<UpdateResponse>, Problem> {
    let result = store.make_admin(parse_id(id)?).await?;
    Ok(Json(result.into()))
}

///////////////////////
//       TESTS
///////////////////////

#[cfg(test)]
mod user_endpoints {
    use bson::doc;
    use rocket::http::{ContentType, Status};
    use serde_json::{json, Value};

    use crate::data::user::USER_COLLECTION_NAME;
    use crate::testing;

    #[rocket::async_test]
    async fn malformed_ids_are_bad_requests() {
        let client = testing::client().await;

        for uri in [
            "/teacher-approve/not-an-id",
            "/teacher-reject/1234",
            "/user/zzzzzzzzzzzzzzzzzzzzzzzz",
        ] {
            let response = client.patch(uri).dispatch().await;
            assert_eq!(response.status(), Status::BadRequest, "{}", uri);

            let body: Value = response.into_json().await.expect("problem json");
            assert_eq!(body["title"], "Invalid identifier.");
        }
    }

    #[rocket::async_test]
    async fn upsert_without_email_is_rejected() {
        let client = testing::client().await;
        let response = client
            .put("/user")
            .header(ContentType::JSON)
            .body(json!({ "email": "", "name": "Nobody" }).to_string())
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::BadRequest);
    }

    #[rocket::async_test]
    #[ignore = "requires a running MongoDB instance"]
    async fn v1_first_login_creates_student() {
        let client = testing::db_client().await;
        let email = testing::unique_email("first_login");

        let response = client
            .put("/user")
            .header(ContentType::JSON)
            .body(json!({ "email": email, "name": "First Login" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok, "an ok response");

        let response = client.get(format!("/user/{}", email)).dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let user: Value = response.into_json().await.expect("invalid response json");
        assert_eq!(user["email"], email);
        assert_eq!(user["role"], "student");
        assert!(user["status"].is_null());

        testing::db(&client)
            .collection::<bson::Document>(USER_COLLECTION_NAME)
            .delete_many(doc! { "email": &email }, None)
            .await
            .expect("unable to delete test user");
    }

    #[rocket::async_test]
    #[ignore = "requires a running MongoDB instance"]
    async fn v1_repeated_applications_keep_latest_payload() {
        let client = testing::db_client().await;
        let email = testing::unique_email("applicant");

        client
            .put("/user")
            .header(ContentType::JSON)
            .body(json!({ "email": email }).to_string())
            .dispatch()
            .await;

        let mut last: Value = Value::Null;
        for experience in 1..=3 {
            let response = client
                .put("/user")
                .header(ContentType::JSON)
                .body(
                    json!({
                        "email": email,
                        "status": "Pending",
                        "teacherReqData": { "experience": experience },
                    })
                    .to_string(),
                )
                .dispatch()
                .await;
            assert_eq!(response.status(), Status::Ok);
            last = response.into_json().await.expect("invalid response json");
        }

        assert_eq!(last["status"], "Pending");
        assert_eq!(last["teacherReqData"]["experience"], 3);

        // Without a pending status the stored user is returned untouched.
        let response = client
            .put("/user")
            .header(ContentType::JSON)
            .body(json!({ "email": email, "teacherReqData": { "experience": 9 } }).to_string())
            .dispatch()
            .await;
        let unchanged: Value = response.into_json().await.expect("invalid response json");
        assert_eq!(unchanged["teacherReqData"]["experience"], 3);

        testing::db(&client)
            .collection::<bson::Document>(USER_COLLECTION_NAME)
            .delete_many(doc! { "email": &email }, None)
            .await
            .expect("unable to delete test user");
    }

    #[rocket::async_test]
    #[ignore = "requires a running MongoDB instance"]
    async fn v1_teacher_approve_sets_role_and_status() {
        let client = testing::db_client().await;
        let email = testing::unique_email("approved_teacher");

        let response = client
            .put("/user")
            .header(ContentType::JSON)
            .body(json!({ "email": email, "status": "Pending" }).to_string())
            .dispatch()
            .await;
        let user: Value = response.into_json().await.expect("invalid response json");
        let id = user["_id"].as_str().expect("user id").to_string();

        let response = client
            .patch(format!("/teacher-approve/{}", id))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let result: Value = response.into_json().await.expect("invalid response json");
        assert_eq!(result["matchedCount"], 1);

        let response = client.get(format!("/user/{}", email)).dispatch().await;
        let user: Value = response.into_json().await.expect("invalid response json");
        assert_eq!(user["role"], "teacher");
        assert_eq!(user["status"], "Accepted");

        let response = client.get("/teacher-requests").dispatch().await;
        let requests: Vec<Value> = response.into_json().await.expect("invalid response json");
        assert!(requests.iter().any(|it| it["email"] == email.as_str()));

        testing::db(&client)
            .collection::<bson::Document>(USER_COLLECTION_NAME)
            .delete_many(doc! { "email": &email }, None)
            .await
            .expect("unable to delete test user");
    }

    async fn applicant_id(client: &rocket::local::asynchronous::Client, email: &str) -> String {
        let response = client
            .put("/user")
            .header(ContentType::JSON)
            .body(json!({ "email": email, "status": "Pending" }).to_string())
            .dispatch()
            .await;
        let user: Value = response.into_json().await.expect("invalid response json");
        user["_id"].as_str().expect("user id").to_string()
    }

    #[rocket::async_test]
    #[ignore = "requires a running MongoDB instance"]
    async fn v1_teacher_reject_keeps_student_role() {
        let client = testing::db_client().await;
        let email = testing::unique_email("rejected_teacher");
        let id = applicant_id(&client, &email).await;

        let response = client
            .patch(format!("/teacher-reject/{}", id))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let result: Value = response.into_json().await.expect("invalid response json");
        assert_eq!(result["modifiedCount"], 1);

        let response = client.get(format!("/user/{}", email)).dispatch().await;
        let user: Value = response.into_json().await.expect("invalid response json");
        assert_eq!(user["status"], "Rejected");
        assert_eq!(user["role"], "student");

        testing::db(&client)
            .collection::<bson::Document>(USER_COLLECTION_NAME)
            .delete_many(doc! { "email": &email }, None)
            .await
            .expect("unable to delete test user");
    }

    #[rocket::async_test]
    #[ignore = "requires a running MongoDB instance"]
    async fn v1_make_admin_sets_role() {
        let client = testing::db_client().await;
        let email = testing::unique_email("admin");

        let response = client
            .put("/user")
            .header(ContentType::JSON)
            .body(json!({ "email": email }).to_string())
            .dispatch()
            .await;
        let user: Value = response.into_json().await.expect("invalid response json");
        let id = user["_id"].as_str().expect("user id").to_string();

        let response = client.patch(format!("/user/{}", id)).dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let result: Value = response.into_json().await.expect("invalid response json");
        assert_eq!(result["matchedCount"], 1);

        let response = client.get(format!("/user/{}", email)).dispatch().await;
        let user: Value = response.into_json().await.expect("invalid response json");
        assert_eq!(user["role"], "admin");
        assert!(user["status"].is_null());

        testing::db(&client)
            .collection::<bson::Document>(USER_COLLECTION_NAME)
            .delete_many(doc! { "email": &email }, None)
            .await
            .expect("unable to delete test user");
    }
}
