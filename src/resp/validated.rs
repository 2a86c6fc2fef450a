use std::ops::Deref;

use rocket::data::{self, Data, FromData};
use rocket::outcome::Outcome::{Error, Forward, Success};
use rocket::request::Request;
use rocket::serde::json::{self, Json};
use serde::de::DeserializeOwned;

use crate::resp::problem::{problems, Problem};

/// Request bodies that check their own contents before reaching a handler.
pub trait Validate {
    fn validate(&self) -> Result<(), Problem>;
}

/// JSON request body that was parsed and passed [`Validate::validate`].
///
/// Handlers take `Result<Validated<T>, Problem>` so that parsing and
/// validation problems are returned to the client as-is.
#[derive(Debug, Clone)]
pub struct Validated<T>(pub T);

impl<T> Validated<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Validated<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r, T> FromData<'r> for Validated<T>
where
    T: DeserializeOwned + Validate + Send + 'static,
{
    type Error = Problem;

    async fn from_data(req: &'r Request<'_>, data: Data<'r>) -> data::Outcome<'r, Self> {
        match Json::<T>::from_data(req, data).await {
            Success(Json(value)) => match value.validate() {
                Ok(()) => Success(Validated(value)),
                Err(problem) => {
                    tracing::debug!("request body failed validation: {}", problem);
                    Error((problem.status, problem))
                }
            },
            Error((status, json::Error::Parse(_, e))) => {
                tracing::debug!("unable to parse request body: {}", e);
                Error((status, problems::parse_problem(e)))
            }
            Error((status, json::Error::Io(e))) => {
                tracing::debug!("unable to read request body: {}", e);
                Error((status, problems::from_status(status).detail(e).to_owned()))
            }
            Forward(f) => Forward(f),
        }
    }
}

/// Like [`Validated`], but a request without a body reads as `None`.
///
/// A body that is present still has to parse and validate.
#[derive(Debug, Clone)]
pub struct OptionalBody<T>(pub Option<T>);

impl<T> OptionalBody<T> {
    pub fn into_inner(self) -> Option<T> {
        self.0
    }
}

#[rocket::async_trait]
impl<'r, T> FromData<'r> for OptionalBody<T>
where
    T: DeserializeOwned + Validate + Send + 'static,
{
    type Error = Problem;

    async fn from_data(req: &'r Request<'_>, mut data: Data<'r>) -> data::Outcome<'r, Self> {
        if data.peek(1).await.is_empty() {
            return Success(OptionalBody(None));
        }

        Validated::<T>::from_data(req, data)
            .await
            .map(|body| OptionalBody(Some(body.into_inner())))
    }
}
