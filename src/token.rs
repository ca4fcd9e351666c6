/// Tokens must be strictly longer than this many characters.
pub const MIN_TOKEN_LENGTH: usize = 10;

/// is_valid_token
///
/// Syntactic token check used by the session and the route guard: a token is
/// accepted iff it is longer than [`MIN_TOKEN_LENGTH`] characters.
///
/// There is no signature, expiry, or issuer verification here. The token is
/// treated as an opaque value issued by the server, which remains the real
/// authorization boundary.
pub fn is_valid_token(token: &str) -> bool {
    token.chars().count() > MIN_TOKEN_LENGTH
}

/// Same check for a token that may be absent.
pub fn is_valid_opt(token: Option<&str>) -> bool {
    token.is_some_and(is_valid_token)
}
