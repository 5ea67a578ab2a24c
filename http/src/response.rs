//! Success payload of the HTTP transport.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A 2xx response, fully read.
///
/// The body is kept as raw bytes, so binary payloads survive untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers in arrival order, lowercase names. Repeated headers
    /// (e.g. `set-cookie`) appear once per occurrence.
    pub headers: Vec<(String, String)>,
    /// Response body
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// First value of a header (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Every value of a header, in arrival order (case-insensitive).
    pub fn header_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> {
        self.headers
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Borrow the body as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns the decoding error if the body is not valid UTF-8.
    pub fn text(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.body)
    }

    /// Deserialize the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn test_header_lookup_and_json() {
        let response = HttpResponse {
            status: 200,
            headers: vec![
                ("content-type".to_string(), "application/json".to_string()),
                ("set-cookie".to_string(), "a=1".to_string()),
                ("set-cookie".to_string(), "b=2".to_string()),
            ],
            body: br#"{"data":42}"#.to_vec(),
        };

        assert_eq!(response.header("Content-Type"), Some("application/json"));
        assert_eq!(
            response.header_all("Set-Cookie").collect::<Vec<_>>(),
            vec!["a=1", "b=2"]
        );
        assert_eq!(response.text().ok(), Some(r#"{"data":42}"#));
        assert_eq!(response.json::<Value>().ok(), Some(json!({"data": 42})));
        assert!(response.json::<Vec<u8>>().is_err());
    }

    #[test]
    fn test_binary_body_is_not_text() {
        let response = HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10],
        };
        assert!(response.text().is_err());
        assert_eq!(response.body.len(), 6);
    }
}
