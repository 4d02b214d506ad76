//! `Authorization` header parsing

use crate::error::AuthError;

/// Extract the token from an `Authorization: Bearer <token>` value.
///
/// The scheme is matched case-insensitively. A missing header, another
/// scheme, or an empty token are all `MissingAuth`.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.map(str::trim).ok_or(AuthError::MissingAuth)?;
    let (scheme, token) = header.split_once(' ').ok_or(AuthError::MissingAuth)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MissingAuth);
    }

    let token = token.trim();
    if token.is_empty() || token.contains(char::is_whitespace) {
        return Err(AuthError::MissingAuth);
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_token() {
        assert_eq!(extract_bearer(Some("Bearer abc.def.ghi")), Ok("abc.def.ghi"));
        assert_eq!(extract_bearer(Some("bearer   abc.def.ghi ")), Ok("abc.def.ghi"));
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(extract_bearer(None), Err(AuthError::MissingAuth));
        assert_eq!(extract_bearer(Some("")), Err(AuthError::MissingAuth));
    }

    #[test]
    fn test_wrong_scheme() {
        assert_eq!(extract_bearer(Some("Token abc")), Err(AuthError::MissingAuth));
        assert_eq!(extract_bearer(Some("Basic dXNlcjpwYXNz")), Err(AuthError::MissingAuth));
    }

    #[test]
    fn test_no_token() {
        assert_eq!(extract_bearer(Some("Bearer")), Err(AuthError::MissingAuth));
        assert_eq!(extract_bearer(Some("Bearer    ")), Err(AuthError::MissingAuth));
        assert_eq!(extract_bearer(Some("InvalidFormat")), Err(AuthError::MissingAuth));
        assert_eq!(extract_bearer(Some("Bearer a b")), Err(AuthError::MissingAuth));
    }
}
