use rocket::serde::json::Json;
use rocket::State;
use utoipa::ToSchema;

use crate::payment::{price_to_cents, PaymentError, StripeClient};
use crate::resp::jwt::{Claims, TokenIssuer};
use crate::resp::problem::{problems, Problem};
use crate::resp::validated::{Validate, Validated};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

/// Sign the posted claims into a token
///
/// The body may be any JSON object. `iat` and `exp` are set by the server.
#[utoipa::path(
    responses(
        (status = 200, description = "Signed token", body = TokenResponse),
        (status = 422, description = "Body is not a JSON object", body = Problem),
    )
)]
#[post("/jwt", data = "<claims>")]
#[tracing::instrument(skip(claims, tokens))]
pub fn issue_token(
    claims: Json<Claims>,
    tokens: &State<TokenIssuer>,
) -> Result<Json<TokenResponse>, Problem> {
    let token = tokens.issue(claims.into_inner())?;
    Ok(Json(TokenResponse { token }))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PaymentIntentRequest {
    /// Price in the configured currency, e.g. `19.99`.
    pub price: f64,
}

impl Validate for PaymentIntentRequest {
    fn validate(&self) -> Result<(), Problem> {
        match price_to_cents(self.price) {
            Some(_) => Ok(()),
            None => Err(problems::bad_field(
                "price",
                "Price must amount to at least one cent.",
            )),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentResponse {
    pub client_secret: String,
}

/// Create a card payment intent
#[utoipa::path(
    request_body = PaymentIntentRequest,
    responses(
        (status = 200, description = "Client secret of the payment intent", body = PaymentIntentResponse),
        (status = 400, description = "Price under one cent", body = Problem),
        (status = 402, description = "Payment provider rejected the intent", body = Problem),
        (status = 502, description = "Payment provider unreachable", body = Problem),
    )
)]
#[post("/create-payment-intent", data = "<payment>")]
#[tracing::instrument(skip(stripe))]
pub async fn create_payment_intent(
    payment: Result<Validated<PaymentIntentRequest>, Problem>,
    stripe: &State<StripeClient>,
) -> Result<Json<PaymentIntentResponse>, Problem> {
    let payment = payment?;
    let amount = price_to_cents(payment.price).ok_or_else(|| {
        problems::bad_field("price", "Price must amount to at least one cent.")
    })?;

    tracing::info!("Creating payment intent for {} {}.", amount, stripe.currency());
    let intent = stripe.create_payment_intent(amount).await?;
    let client_secret = intent
        .client_secret
        .ok_or(PaymentError::MissingClientSecret)?;

    Ok(Json(PaymentIntentResponse { client_secret }))
}
