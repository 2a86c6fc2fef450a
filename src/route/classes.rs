use rocket::serde::json::Json;
use rocket::State;

use crate::data::class::db::{AssignmentCreateData, ClassCreateData, ClassDbExt, ClassReviewData};
use crate::data::class::{Class, ClassResponse};
use crate::data::{parse_id, ApprovalStatus, DeleteResponse, InsertResponse, UpdateResponse};
use crate::resp::problem::Problem;
use crate::resp::validated::{OptionalBody, Validated};
use crate::store::Store;

fn class_responses(classes: Vec<Class>) -> Json<Vec<ClassResponse>> {
    Json(classes.into_iter().map(ClassResponse::from).collect())
}

/// List classes open to students
#[utoipa::path(
    responses(
        (status = 200, description = "Accepted classes", body = [ClassResponse]),
    )
)]
#[get("/classes")]
#[tracing::instrument(skip(store))]
pub async fn class_list(store: &State<Store>) -> Result<Json<Vec<ClassResponse>>, Problem> {
    let classes = store.list_classes(Some(ApprovalStatus::Accepted)).await?;
    Ok(class_responses(classes))
}

/// List every class regardless of review state
#[utoipa::path(
    responses(
        (status = 200, description = "All classes", body = [ClassResponse]),
    )
)]
#[get("/enrolledClasses")]
#[tracing::instrument(skip(store))]
pub async fn class_list_all(store: &State<Store>) -> Result<Json<Vec<ClassResponse>>, Problem> {
    Ok(class_responses(store.list_classes(None).await?))
}

/// Get class information
#[utoipa::path(
    params(
        ("id", description = "class ObjectId")
    ),
    responses(
        (status = 200, description = "The class, or null if none exists", body = ClassResponse),
        (status = 400, description = "Malformed id", body = Problem),
    )
)]
#[get("/classes/<id>")]
#[tracing::instrument(skip(store))]
pub async fn class_get(
    id: &str,
    store: &State<Store>,
) -> Result<Json<Option<ClassResponse>>, Problem> {
    let class = store.get_class(parse_id(id)?).await?;
    Ok(Json(class.map(ClassResponse::from)))
}

/// Get class information for an enrolled student
#[utoipa::path(
    params(
        ("id", description = "class ObjectId")
    ),
    responses(
        (status = 200, description = "The class, or null if none exists", body = ClassResponse),
        (status = 400, description = "Malformed id", body = Problem),
    )
)]
#[get("/enrolled-class/<id>")]
#[tracing::instrument(skip(store))]
pub async fn enrolled_class_get(
    id: &str,
    store: &State<Store>,
) -> Result<Json<Option<ClassResponse>>, Problem> {
    class_get(id, store).await
}

/// List classes owned by a teacher
#[utoipa::path(
    params(
        ("email", description = "teacher email")
    ),
    responses(
        (status = 200, description = "Classes of the teacher", body = [ClassResponse]),
    )
)]
#[get("/teacher-classes/<email>")]
#[tracing::instrument(skip(store))]
pub async fn teacher_classes(
    email: &str,
    store: &State<Store>,
) -> Result<Json<Vec<ClassResponse>>, Problem> {
    Ok(class_responses(store.list_teacher_classes(email).await?))
}

/// List classes awaiting or past review
#[utoipa::path(
    responses(
        (status = 200, description = "Reviewed and pending classes", body = [ClassResponse]),
    )
)]
#[get("/class-requests")]
#[tracing::instrument(skip(store))]
pub async fn class_requests(store: &State<Store>) -> Result<Json<Vec<ClassResponse>>, Problem> {
    Ok(class_responses(store.list_class_requests().await?))
}

/// Create a class
///
/// New classes start out `Pending` until an admin reviews them.
#[utoipa::path(
    request_body = ClassCreateData,
    responses(
        (status = 200, description = "Insert result", body = InsertResponse),
        (status = 400, description = "Missing title or owner", body = Problem),
    )
)]
#[post("/classes", data = "<class>")]
#[tracing::instrument(skip(store))]
pub async fn class_create(
    class: Result<Validated<ClassCreateData>, Problem>,
    store: &State<Store>,
) -> Result<Json<InsertResponse>, Problem> {
    let result = store.create_class(class?.into_inner()).await?;
    Ok(Json(result.into()))
}

/// Overwrite the listing fields of a class
#[utoipa::path(
    params(
        ("id", description = "class ObjectId")
    ),
    request_body = ClassCreateData,
    responses(
        (status = 200, description = "Update result", body = UpdateResponse),
        (status = 400, description = "Malformed id or body", body = Problem),
    )
)]
#[put("/classes/<id>", data = "<class>")]
#[tracing::instrument(skip(store))]
pub async fn class_update(
    id: &str,
    class: Result<Validated<ClassCreateData>, Problem>,
    store: &State<Store>,
) -> Result<Json<UpdateResponse>, Problem> {
    let id = parse_id(id)?;
    let result = store.update_class(id, class?.into_inner()).await?;
    Ok(Json(result.into()))
}

/// Accept a class
#[utoipa::path(
    params(
        ("id", description = "class ObjectId")
    ),
    request_body(content = ClassReviewData, description = "Optional admin feedback"),
    responses(
        (status = 200, description = "Update result", body = UpdateResponse),
        (status = 400, description = "Malformed id", body = Problem),
        (status = 422, description = "Malformed feedback body", body = Problem),
    )
)]
#[patch("/class-approve/<id>", data = "<review>")]
#[tracing::instrument(skip(store))]
pub async fn class_approve(
    id: &str,
    review: Result<OptionalBody<ClassReviewData>, Problem>,
    store: &State<Store>,
) -> Result<Json<UpdateResponse>, Problem> {
    let review = review?.into_inner().unwrap_or_default();
    let result = store
        .review_class(parse_id(id)?, ApprovalStatus::Accepted, review)
        .await?;
    Ok(Json(result.into()))
}

/// Reject a class
#[utoipa::path(
    params(
        ("id", description = "class ObjectId")
    ),
    request_body(content = ClassReviewData, description = "Optional admin feedback"),
    responses(
        (status = 200, description = "Update result", body = UpdateResponse),
        (status = 400, description = "Malformed id", body = Problem),
        (status = 422, description = "Malformed feedback body", body = Problem),
    )
)]
#[patch("/class-reject/<id>", data = "<review>")]
#[tracing::instrument(skip(store))]
pub async fn class_reject(
    id: &str,
    review: Result<OptionalBody<ClassReviewData>, Problem>,
    store: &State<Store>,
) -> Result<Json<UpdateResponse>, Problem> {
    let review = review?.into_inner().unwrap_or_default();
    let result = store
        .review_class(parse_id(id)?, ApprovalStatus::Rejected, review)
        .await?;
    Ok(Json(result.into()))
}

/// Delete a class
#[utoipa::path(
    params(
        ("id", description = "class ObjectId")
    ),
    responses(
        (status = 200, description = "Delete result", body = DeleteResponse),
        (status = 400, description = "Malformed id", body = Problem),
    )
)]
#[delete("/classes/<id>")]
#[tracing::instrument(skip(store))]
pub async fn class_delete(id: &str, store: &State<Store>) -> Result<Json<DeleteResponse>, Problem> {
    let result = store.delete_class(parse_id(id)?).await?;
    Ok(Json(result.into()))
}

/// Append an assignment to a class
#[utoipa::path(
    params(
        ("id", description = "class ObjectId")
    ),
    request_body = AssignmentCreateData,
    responses(
        (status = 200, description = "Update result", body = UpdateResponse),
        (status = 400, description = "Malformed id or body", body = Problem),
    )
)]
#[put("/add-assignment/<id>", data = "<assignment>")]
#[tracing::instrument(skip(store))]
pub async fn assignment_add(
    id: &str,
    assignment: Result<Validated<AssignmentCreateData>, Problem>,
    store: &State<Store>,
) -> Result<Json<UpdateResponse>, Problem> {
    let id = parse_id(id)?;
    let result = store.add_assignment(id, assignment?.into_inner()).await?;
    Ok(Json(result.into()))
}

///////////////////////
//       TESTS
///////////////////////
