use url::Url;

use crate::http::error::HttpError;

/// HTTP request methods.
///
/// Only GET and POST have handlers; every other token is carried verbatim so
/// it can be answered with 405 Method Not Allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// POST - Upload or submit data
    POST,
    /// Anything else, exactly as sent
    Other(String),
}

impl Method {
    /// Classifies a method token.
    ///
    /// Matching is exact and case-sensitive:
    ///
    /// ```
    /// # use portico::http::request::Method;
    /// assert_eq!(Method::from_token("GET"), Method::GET);
    /// assert_eq!(Method::from_token("get"), Method::Other("get".to_string()));
    /// ```
    pub fn from_token(token: &str) -> Self {
        match token {
            "GET" => Method::GET,
            "POST" => Method::POST,
            other => Method::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::Other(token) => token,
        }
    }
}

/// The first line of a request: `METHOD SP TARGET SP VERSION`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// The raw request target (e.g., "/index.html?x=1")
    pub target: String,
    /// HTTP version (typically "HTTP/1.1")
    pub version: String,
}

impl RequestLine {
    /// Splits a request line on single spaces.
    ///
    /// Fewer than three tokens is a protocol error. Trailing empty tokens are
    /// ignored and extra tokens beyond the third are tolerated.
    pub fn parse(line: &str) -> Result<Self, HttpError> {
        let mut tokens: Vec<&str> = line.split(' ').collect();
        while tokens.last().is_some_and(|t| t.is_empty()) {
            tokens.pop();
        }

        if tokens.len() < 3 {
            return Err(HttpError::protocol(format!(
                "improper request line - {}",
                line
            )));
        }

        Ok(RequestLine {
            method: Method::from_token(tokens[0]),
            target: tokens[1].to_string(),
            version: tokens[2].to_string(),
        })
    }

    /// Path component of the target, still percent-encoded.
    ///
    /// Both origin-form (`/a/b?q`) and absolute-form (`http://host/a/b`)
    /// targets are accepted. Dot segments are resolved.
    pub fn path(&self) -> Result<String, HttpError> {
        let base = Url::parse("http://localhost/")
            .map_err(|e| HttpError::protocol(format!("base url: {}", e)))?;

        let uri = Url::options()
            .base_url(Some(&base))
            .parse(&self.target)
            .map_err(|e| {
                HttpError::protocol(format!(
                    "wrong request-uri in request-line - {} ({})",
                    self.target, e
                ))
            })?;

        Ok(uri.path().to_string())
    }
}
