pub mod newsletter;
pub mod slug;
pub mod subscriber;
pub mod subscriber_email;
pub mod subscriber_name;
pub mod token;
