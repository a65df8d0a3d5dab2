use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::subscriber_email::SubscriberEmail;
use crate::domain::subscriber_name::SubscriberName;

/// A mailing-list member. Records are deactivated on unsubscribe, never
/// deleted; only an administrator removes a row for good.
///
/// The token fields are capability tokens: possession is authorization.
/// They are excluded from serialization so no API response can leak them.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    pub id: Uuid,
    pub email: SubscriberEmail,
    pub name: Option<SubscriberName>,
    pub active: bool,
    pub confirmed: bool,
    #[serde(skip_serializing)]
    pub confirm_token: String,
    #[serde(skip_serializing)]
    pub unsub_token: String,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub unsubscribed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
