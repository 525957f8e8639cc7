use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::interest::Interests;
use crate::domain::subscriber::Subscriber;
use crate::routes::subscriptions::FailureResponse;
use crate::storage::{Storage, StoreStatus};
use crate::store::{error_chain_fmt, StoreError};

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberSummary {
    pub email: String,
    pub interests: Interests,
    pub subscribed_at: DateTime<Utc>,
    pub source: String,
}

impl From<Subscriber> for SubscriberSummary {
    fn from(subscriber: Subscriber) -> Self {
        SubscriberSummary {
            email: subscriber.email.to_string(),
            interests: subscriber.interests,
            subscribed_at: subscriber.subscribed_at,
            source: subscriber.source,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct SubscribersResponse {
    pub success: bool,
    pub count: usize,
    pub subscribers: Vec<SubscriberSummary>,
}

#[tracing::instrument(name = "Listing subscribers handler", skip(storage))]
pub async fn list_subscribers(
    storage: web::Data<Storage>,
) -> Result<HttpResponse, ListSubscribersError> {
    let store = match storage.store_status().await {
        StoreStatus::Connected(store) => store,
        StoreStatus::Unavailable => return Err(ListSubscribersError::DatabaseNotConnected),
        StoreStatus::Failed(err) => return Err(ListSubscribersError::GetSubscribersError(err)),
    };

    let subscribers = match store.list_all().await {
        Ok(subscribers) => subscribers,
        Err(err) if err.is_unavailable() => {
            storage.mark_unavailable().await;
            return Err(ListSubscribersError::DatabaseNotConnected);
        }
        Err(err) => return Err(ListSubscribersError::GetSubscribersError(err)),
    };

    let subscribers: Vec<SubscriberSummary> =
        subscribers.into_iter().map(SubscriberSummary::from).collect();

    Ok(HttpResponse::Ok().json(SubscribersResponse {
        success: true,
        count: subscribers.len(),
        subscribers,
    }))
}

#[derive(thiserror::Error)]
pub enum ListSubscribersError {
    #[error("Database not connected")]
    DatabaseNotConnected,
    #[error("Failed to get subscribers from the database.")]
    GetSubscribersError(#[source] StoreError),
}

impl std::fmt::Debug for ListSubscribersError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for ListSubscribersError {
    fn status_code(&self) -> StatusCode {
        match self {
            ListSubscribersError::DatabaseNotConnected => StatusCode::SERVICE_UNAVAILABLE,
            ListSubscribersError::GetSubscribersError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ListSubscribersError::DatabaseNotConnected => FailureResponse {
                success: false,
                message: "Database not connected",
                demo: Some(true),
            },
            ListSubscribersError::GetSubscribersError(err) => {
                tracing::error!("Error fetching subscribers: {:?}", err);
                FailureResponse::new("Error fetching subscribers")
            }
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}
