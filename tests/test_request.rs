use portico::http::error::HttpError;
use portico::http::headers::{HeaderMap, parse_parameters};
use portico::http::request::{Method, RequestLine};

#[test]
fn test_request_line_tokens() {
    let line = RequestLine::parse("GET /index.html HTTP/1.1").unwrap();

    assert_eq!(line.method, Method::GET);
    assert_eq!(line.target, "/index.html");
    assert_eq!(line.version, "HTTP/1.1");
}

#[test]
fn test_request_line_too_short() {
    let err = RequestLine::parse("GET /").unwrap_err();
    match err {
        HttpError::Protocol(reason) => assert!(reason.contains("improper request line")),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_request_line_trailing_space_is_ignored() {
    let line = RequestLine::parse("POST /upload HTTP/1.1 ").unwrap();
    assert_eq!(line.method, Method::POST);
    assert_eq!(line.version, "HTTP/1.1");

    assert!(RequestLine::parse("GET /   ").is_err());
}

#[test]
fn test_unknown_methods_are_kept_verbatim() {
    let line = RequestLine::parse("DELETE /x HTTP/1.1").unwrap();
    assert_eq!(line.method, Method::Other("DELETE".to_string()));
    assert_eq!(line.method.as_str(), "DELETE");
}

#[test]
fn test_path_strips_query() {
    let line = RequestLine::parse("GET /search?q=rust HTTP/1.1").unwrap();
    assert_eq!(line.path().unwrap(), "/search");
}

#[test]
fn test_path_from_absolute_target() {
    let line = RequestLine::parse("GET http://example.com/a/b.txt HTTP/1.1").unwrap();
    assert_eq!(line.path().unwrap(), "/a/b.txt");
}

#[test]
fn test_path_keeps_percent_encoding() {
    let line = RequestLine::parse("GET /a%20b.txt HTTP/1.1").unwrap();
    assert_eq!(line.path().unwrap(), "/a%20b.txt");
}

#[test]
fn test_path_resolves_dot_segments() {
    let line = RequestLine::parse("GET /a/../../etc/passwd HTTP/1.1").unwrap();
    assert_eq!(line.path().unwrap(), "/etc/passwd");
}

#[test]
fn test_header_names_are_case_sensitive() {
    let headers = HeaderMap::parse("Content-Length: 4");
    assert_eq!(headers.get("Content-Length"), Some("4"));
    assert_eq!(headers.get("content-length"), None);
}

#[test]
fn test_repeated_headers_fold() {
    let headers = HeaderMap::parse("Accept: text/html\r\nAccept: */*");
    assert_eq!(headers.get("Accept"), Some("text/html,*/*"));
}

#[test]
fn test_header_whitespace_and_junk_lines() {
    let headers = HeaderMap::parse("Host :   example.com  \r\nBrokenHeader\r\nEmpty:\r\n: novalue");
    assert_eq!(headers.len(), 1);
    assert_eq!(headers.get("Host"), Some("example.com"));
}

#[test]
fn test_header_value_keeps_later_colons() {
    let headers = HeaderMap::parse("If-Modified-Since: Sun, 06 Nov 1994 08:49:37 GMT");
    assert_eq!(
        headers.get("If-Modified-Since"),
        Some("Sun, 06 Nov 1994 08:49:37 GMT")
    );
}

#[test]
fn test_content_disposition_parameters() {
    let params = parse_parameters("form-data; name=\"file\"; filename=\"a.txt\"");
    assert_eq!(params.get("name").map(String::as_str), Some("\"file\""));
    assert_eq!(params.get("filename").map(String::as_str), Some("\"a.txt\""));
}

#[test]
fn test_reparsing_serialized_headers_is_stable() {
    let parsed = HeaderMap::parse(
        "Host:  example.com\r\nAccept: text/html\r\nAccept: */*\r\nX-Empty:\r\nUser-Agent: curl/8.0",
    );

    let serialized: Vec<String> = parsed
        .iter()
        .map(|(name, value)| format!("{}: {}", name, value))
        .collect();
    let reparsed = HeaderMap::parse(&serialized.join("\r\n"));

    assert_eq!(reparsed, parsed);
}
