use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

const TOKEN_LENGTH: usize = 64;

/// Generates an opaque capability token (confirm / unsubscribe).
/// `thread_rng` is cryptographically secure, which matters here:
/// possession of a token is authorization.
pub fn generate_token() -> String {
    let mut rng = thread_rng();

    std::iter::repeat_with(|| rng.sample(Alphanumeric))
        .map(char::from)
        .take(TOKEN_LENGTH)
        .collect()
}
