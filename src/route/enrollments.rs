use rocket::serde::json::Json;
use rocket::State;

use crate::data::enrollment::db::{EnrollData, EnrollmentDbExt};
use crate::data::enrollment::EnrollmentResponse;
use crate::data::InsertResponse;
use crate::resp::problem::Problem;
use crate::resp::validated::Validated;
use crate::store::Store;

/// List the enrollments of a user
#[utoipa::path(
    params(
        ("email", description = "student email")
    ),
    responses(
        (status = 200, description = "Enrollments of the user", body = [EnrollmentResponse]),
    )
)]
#[get("/enrolled-classes/<email>")]
#[tracing::instrument(skip(store))]
pub async fn enrollment_list(
    email: &str,
    store: &State<Store>,
) -> Result<Json<Vec<EnrollmentResponse>>, Problem> {
    let enrollments = store.list_enrollments(email).await?;
    Ok(Json(
        enrollments
            .into_iter()
            .map(EnrollmentResponse::from)
            .collect(),
    ))
}

/// Record a paid enrollment
#[utoipa::path(
    request_body = EnrollData,
    responses(
        (status = 200, description = "Insert result", body = InsertResponse),
        (status = 400, description = "Missing email or malformed class id", body = Problem),
    )
)]
#[post("/enroll", data = "<enrollment>")]
#[tracing::instrument(skip(store))]
pub async fn enroll(
    enrollment: Result<Validated<EnrollData>, Problem>,
    store: &State<Store>,
) -> Result<Json<InsertResponse>, Problem> {
    let result = store.enroll(enrollment?.into_inner()).await?;
    Ok(Json(result.into()))
}
