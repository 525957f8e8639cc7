use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::interest::Interests;
use crate::domain::subscriber_email::SubscriberEmail;

#[derive(Debug, Clone, serde::Serialize)]
pub struct Subscriber {
    pub id: Uuid,
    pub email: SubscriberEmail,
    pub interests: Interests,
    pub subscribed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub source: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl Subscriber {
    /// Replaces the interest tags. Nothing else on a subscriber is ever rewritten.
    pub fn with_interests(mut self, interests: Interests) -> Subscriber {
        self.interests = interests;
        self.updated_at = Utc::now();
        self
    }
}
