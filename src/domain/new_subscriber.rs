use serde::Deserialize;

use crate::domain::interest::Interests;
use crate::domain::subscriber_email::SubscriberEmail;

pub const SUBSCRIBER_SOURCE: &str = "coming-soon-page";

/// Best-effort request metadata stored next to a subscription. Diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    pub ip_address: String,
    pub user_agent: String,
}

impl Default for Provenance {
    fn default() -> Self {
        Provenance {
            ip_address: String::from("unknown"),
            user_agent: String::new(),
        }
    }
}

pub struct NewSubscriber {
    pub email: SubscriberEmail,
    pub interests: Interests,
    pub provenance: Provenance,
}

/// Body accepted by the subscribe endpoint. `email` stays optional here so a missing field is
/// reported with the same message as a malformed one.
#[derive(Deserialize, Debug, Default)]
pub struct NewSubscriberBody {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub interests: Option<Interests>,
}
