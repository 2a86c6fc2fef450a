use rocket::http::Status;
use rocket::{Build, Request, Rocket, Route};

pub mod auth;
pub mod classes;
pub mod enrollments;
pub mod users;

use auth::*;
use classes::*;
use enrollments::*;
use users::*;

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    data::{
        class::{
            db::{AssignmentCreateData, ClassCreateData, ClassReviewData},
            AssignmentResponse, ClassResponse,
        },
        enrollment::{db::EnrollData, EnrollmentResponse},
        user::{db::UserUpsertData, UserResponse},
        ApprovalStatus, DeleteResponse, InsertResponse, UpdateResponse,
    },
    resp::problem::{problems, Problem},
    role::Role,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        index,
        issue_token,
        create_payment_intent,
        user_list,
        teacher_requests,
        user_get,
        user_upsert,
        teacher_approve,
        teacher_reject,
        user_make_admin,
        class_list,
        class_get,
        teacher_classes,
        class_requests,
        class_create,
        class_update,
        class_approve,
        class_reject,
        class_delete,
        class_list_all,
        enrollment_list,
        enrolled_class_get,
        enroll,
        assignment_add
    ),
    components(schemas(
        Role,
        ApprovalStatus,
        UserResponse,
        UserUpsertData,
        ClassResponse,
        ClassCreateData,
        ClassReviewData,
        AssignmentResponse,
        AssignmentCreateData,
        EnrollmentResponse,
        EnrollData,
        InsertResponse,
        UpdateResponse,
        DeleteResponse,
        TokenResponse,
        PaymentIntentRequest,
        PaymentIntentResponse,
        Problem
    ))
)]
pub struct ApiDoc;

/// Landing text, useful as a liveness probe.
#[utoipa::path(responses((status = 200, description = "Welcome message", body = String)))]
#[get("/")]
pub fn index() -> &'static str {
    "Welcome to EduElevate server"
}

#[catch(default)]
pub fn default_catcher(status: Status, req: &Request) -> Problem {
    tracing::debug!("{} {} failed with {}", req.method(), req.uri(), status);
    problems::from_status(status)
}

pub fn api() -> Vec<Route> {
    routes![
        index,
        issue_token,
        create_payment_intent,
        user_list,
        teacher_requests,
        user_get,
        user_upsert,
        teacher_approve,
        teacher_reject,
        user_make_admin,
        class_list,
        class_get,
        teacher_classes,
        class_requests,
        class_create,
        class_update,
        class_approve,
        class_reject,
        class_delete,
        class_list_all,
        enrollment_list,
        enrolled_class_get,
        enroll,
        assignment_add
    ]
}

pub fn mount_api(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .mount("/", api())
        .mount(
            "/",
            SwaggerUi::new("/swagger-ui/<_..>").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .register("/", catchers![default_catcher])
}
