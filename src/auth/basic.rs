use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BasicAuthError {
    #[error("Missing authentication")]
    Missing,

    #[error("Bad HTTP authentication header format")]
    BadScheme,

    #[error("Bad header internal syntax")]
    BadEncoding,

    #[error("HTTP authentication header missing username")]
    MissingId,
}

/// `Basic base64(id:key)`, the header clients send back on every request
pub fn encode_basic(id: &str, key: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", id, key)))
}

/// Split an Authorization header into `(id, key)`. The scheme is matched
/// case-insensitively and the payload splits on the first colon.
pub fn decode_basic(header: &str) -> Result<(String, String), BasicAuthError> {
    let header = header.trim();
    if header.is_empty() {
        return Err(BasicAuthError::Missing);
    }

    let (scheme, payload) = header.split_once(' ').ok_or(BasicAuthError::BadScheme)?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return Err(BasicAuthError::BadScheme);
    }

    let payload = payload.trim();
    if payload.is_empty() {
        return Err(BasicAuthError::BadScheme);
    }

    let decoded = STANDARD.decode(payload).map_err(|_| BasicAuthError::BadEncoding)?;
    let decoded = String::from_utf8(decoded).map_err(|_| BasicAuthError::BadEncoding)?;

    let (id, key) = decoded.split_once(':').ok_or(BasicAuthError::BadEncoding)?;
    if id.is_empty() {
        return Err(BasicAuthError::MissingId);
    }

    Ok((id.to_string(), key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_session_credentials() {
        assert_eq!(encode_basic("ren", "baddog"), "Basic cmVuOmJhZGRvZw==");
    }

    #[test]
    fn decodes_what_it_encodes() {
        let header = encode_basic("5f1e", "0a1b-2c3d:with-colon");
        assert_eq!(
            decode_basic(&header).unwrap(),
            ("5f1e".to_string(), "0a1b-2c3d:with-colon".to_string())
        );
    }

    #[test]
    fn scheme_is_case_insensitive() {
        assert!(decode_basic("bAsIc cmVuOmJhZGRvZw==").is_ok());
    }

    #[test]
    fn rejects_malformed_headers() {
        assert_eq!(decode_basic(""), Err(BasicAuthError::Missing));
        assert_eq!(decode_basic("Bearer abc"), Err(BasicAuthError::BadScheme));
        assert_eq!(decode_basic("Basic"), Err(BasicAuthError::BadScheme));
        assert_eq!(decode_basic("Basic !!!"), Err(BasicAuthError::BadEncoding));
        // "nocolon"
        assert_eq!(decode_basic("Basic bm9jb2xvbg=="), Err(BasicAuthError::BadEncoding));
        // ":key"
        assert_eq!(decode_basic("Basic OmtleQ=="), Err(BasicAuthError::MissingId));
    }
}
