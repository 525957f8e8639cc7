use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use serde::Serialize;

use crate::domain::new_subscriber::{NewSubscriberBody, Provenance};
use crate::intake::{subscribe, SubscribeError, SubscribeOutcome, SubscriptionRequest};
use crate::storage::Storage;

const THANK_YOU_MESSAGE: &str = "Thank you for subscribing! We'll notify you when we launch.";
const ALREADY_SUBSCRIBED_MESSAGE: &str =
    "You're already subscribed! We'll notify you when we launch.";
pub const INVALID_EMAIL_MESSAGE: &str = "Please provide a valid email address";
const SERVER_ERROR_MESSAGE: &str = "Server error. Please try again later.";

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeResponse {
    pub success: bool,
    pub message: &'static str,
    pub already_subscribed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demo: Option<bool>,
}

#[derive(Serialize, Debug)]
pub struct FailureResponse {
    pub success: bool,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demo: Option<bool>,
}

impl FailureResponse {
    pub fn new(message: &'static str) -> Self {
        FailureResponse {
            success: false,
            message,
            demo: None,
        }
    }
}

#[tracing::instrument(
    name = "Creating a new subscriber handler",
    skip(request, body, storage),
    fields(
        subscriber_email = ?body.email,
        subscriber_interests = ?body.interests
    )
)]
pub async fn handle_create_subscription(
    request: HttpRequest,
    body: web::Json<NewSubscriberBody>,
    storage: web::Data<Storage>,
) -> Result<HttpResponse, SubscribeError> {
    let body = body.into_inner();
    let subscription = SubscriptionRequest {
        email: body.email,
        interests: body.interests.unwrap_or_default(),
        provenance: provenance_of(&request),
    };

    let response = match subscribe(&storage, subscription).await? {
        SubscribeOutcome::Created(_) => HttpResponse::Created().json(SubscribeResponse {
            success: true,
            message: THANK_YOU_MESSAGE,
            already_subscribed: false,
            demo: None,
        }),
        SubscribeOutcome::Updated => HttpResponse::Ok().json(SubscribeResponse {
            success: true,
            message: ALREADY_SUBSCRIBED_MESSAGE,
            already_subscribed: true,
            demo: None,
        }),
        SubscribeOutcome::DemoAccepted => HttpResponse::Ok().json(SubscribeResponse {
            success: true,
            message: THANK_YOU_MESSAGE,
            already_subscribed: false,
            demo: Some(true),
        }),
    };

    Ok(response)
}

/// `X-Forwarded-For` wins over the socket address since the service usually sits behind a proxy.
fn provenance_of(request: &HttpRequest) -> Provenance {
    let ip_address = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .map(String::from)
        .or_else(|| request.peer_addr().map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| String::from("unknown"));
    let user_agent = request
        .headers()
        .get(actix_web::http::header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(String::from)
        .unwrap_or_default();

    Provenance {
        ip_address,
        user_agent,
    }
}

impl ResponseError for SubscribeError {
    fn status_code(&self) -> StatusCode {
        match self {
            SubscribeError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
            SubscribeError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            SubscribeError::InvalidEmail(_) => INVALID_EMAIL_MESSAGE,
            SubscribeError::Unexpected(_) => SERVER_ERROR_MESSAGE,
        };

        HttpResponse::build(self.status_code()).json(FailureResponse::new(message))
    }
}
