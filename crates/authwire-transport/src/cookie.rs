//! Cookie header parsing.
//!
//! The client never reads the session cookie itself, but it does echo the
//! anti-forgery cookie back as a header. Cookie stores hand us a single
//! `name=value; name2=value2` string, so this module picks one value out.

/// Returns the percent-decoded value of cookie `name` from a `Cookie`
/// header string.
///
/// Returns `None` when the cookie is absent or its value is empty.
/// A value that is not valid percent-encoding is returned as-is.
pub fn cookie_value(cookie_header: &str, name: &str) -> Option<String> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, raw)| match urlencoding::decode(raw) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => raw.to_string(),
        })
        .filter(|value| !value.is_empty())
}
