use validator::validate_email;

/// A normalized subscriber email address. Email is the identity of a
/// subscriber, so normalization (trim + lowercase) happens here, before any
/// lookup or insert sees the value.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SubscriberEmail(String);

impl SubscriberEmail {
    pub fn parse(email: String) -> Result<SubscriberEmail, String> {
        let normalized = email.trim().to_lowercase();
        // `validate_email` accepts dotless domains; the basic
        // `local@domain.tld` shape we require does not.
        let has_dotted_domain = normalized
            .rsplit_once('@')
            .map(|(_, domain)| domain.contains('.'))
            .unwrap_or(false);

        if !validate_email(&normalized) || !has_dotted_domain {
            return Err(format!("{} is not a valid email address", email));
        }

        Ok(Self(normalized))
    }
}

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubscriberEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
