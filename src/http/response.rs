/// HTTP status codes produced by the server.
///
/// - `Ok` (200): Request successful
/// - `Created` (201): Files uploaded
/// - `NotModified` (304): Client copy is current
/// - `BadRequest` (400): Malformed request
/// - `NotFound` (404): Resource not found
/// - `MethodNotAllowed` (405): HTTP method not supported
/// - `InternalServerError` (500): Server error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 201 Created
    Created,
    /// 304 Not Modified
    NotModified,
    /// 400 Bad Request
    BadRequest,
    /// 404 Not Found
    NotFound,
    /// 405 Method Not Allowed
    MethodNotAllowed,
    /// 500 Internal Server Error
    InternalServerError,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use portico::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotModified.as_u16(), 304);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::Created => 201,
            StatusCode::NotModified => 304,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
            StatusCode::MethodNotAllowed => 405,
            StatusCode::InternalServerError => 500,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use portico::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    /// assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Created => "Created",
            StatusCode::NotModified => "Not Modified",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }
}

/// A response whose body is held in memory.
///
/// File bodies are not built this way; they are streamed by
/// [`ResponseWriter::send_stream`](crate::http::writer::ResponseWriter::send_stream).
#[derive(Debug)]
pub struct Response {
    /// The HTTP status code
    pub status: StatusCode,
    /// Handler-specific headers, in the order they are written
    pub headers: Vec<(String, String)>,
    /// Response body as bytes
    pub body: Vec<u8>,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```ignore
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .header("Content-Type", "text/plain")
///     .body(b"hi".to_vec())
///     .build();
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl ResponseBuilder {
    /// Creates a new response builder with the specified status code.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Adds or replaces a header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.headers.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = value,
            None => self.headers.push((key, value)),
        }
        self
    }

    /// Sets the response body.
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Builds the final Response.
    ///
    /// Adds a trailing Content-Length header from the body size unless one
    /// was set explicitly.
    pub fn build(mut self) -> Response {
        if !self.headers.iter().any(|(k, _)| k == "Content-Length") {
            let length = self.body.len().to_string();
            self.headers.push(("Content-Length".to_string(), length));
        }

        Response {
            status: self.status,
            headers: self.headers,
            body: self.body,
        }
    }
}

impl Response {
    /// A short HTML page: status code and message plus a one-line
    /// explanation (which may itself contain markup).
    pub fn html(status: StatusCode, explanation: &str) -> Self {
        let body = html_page(status, explanation);
        ResponseBuilder::new(status)
            .header("Content-Type", "text/html")
            .body(body.into_bytes())
            .build()
    }

    /// 200 OK with an HTML explanation.
    pub fn ok(explanation: &str) -> Self {
        Self::html(StatusCode::Ok, explanation)
    }

    /// 304 Not Modified, no body.
    pub fn not_modified() -> Self {
        ResponseBuilder::new(StatusCode::NotModified).build()
    }

    /// 400 Bad Request naming what was wrong.
    pub fn bad_request(explanation: &str) -> Self {
        Self::html(StatusCode::BadRequest, &format!("{}<hr>", explanation))
    }

    /// 404 Not Found for a resource that does not exist.
    pub fn not_found(resource: &str) -> Self {
        Self::html(
            StatusCode::NotFound,
            &format!(
                "the file you requested - {} does not exist on server<hr>",
                escape_html(resource)
            ),
        )
    }

    /// 405 for any method without a handler.
    pub fn method_not_allowed() -> Self {
        Self::html(
            StatusCode::MethodNotAllowed,
            "the <i>HTTP</i> method you requested is not supported by our server .. regret any inconvenience!<hr>",
        )
    }

    /// Creates a 500 Internal Server Error response.
    pub fn internal_error(explanation: &str) -> Self {
        Self::html(StatusCode::InternalServerError, explanation)
    }
}

fn html_page(status: StatusCode, explanation: &str) -> String {
    let explanation = if explanation.is_empty() {
        "thats all we know<hr>"
    } else {
        explanation
    };

    format!(
        "<HTML><HEAD><TITLE>{reason}</TITLE></HEAD><BODY><H3>{code}. {reason}</H3></BR><p>{explanation}</p></BODY></HTML>",
        reason = status.reason_phrase(),
        code = status.as_u16(),
    )
}

/// Escapes text for inclusion in HTML element content or a quoted attribute.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
