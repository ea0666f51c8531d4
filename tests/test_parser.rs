use std::time::Duration;

use portico::http::error::HttpError;
use portico::http::headers::HeaderMap;
use portico::http::parser::{read_header_block, read_request_line};
use portico::http::stream::ByteReader;

fn reader(input: &'static [u8]) -> ByteReader<&'static [u8]> {
    ByteReader::new(input, Duration::from_secs(1))
}

#[tokio::test]
async fn test_parse_simple_get_request() {
    let mut r = reader(b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n");

    assert_eq!(read_request_line(&mut r).await.unwrap(), "GET / HTTP/1.1");
    let headers = HeaderMap::parse(&read_header_block(&mut r).await.unwrap());
    assert_eq!(headers.get("Host"), Some("example.com"));
    assert_eq!(r.next_byte().await.unwrap(), None);
}

#[tokio::test]
async fn test_body_is_left_unread() {
    let mut r = reader(b"POST /api HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello");

    read_request_line(&mut r).await.unwrap();
    read_header_block(&mut r).await.unwrap();

    let rest = r.fill().await.unwrap();
    assert_eq!(rest, b"hello");
}

#[tokio::test]
async fn test_parse_multiple_headers() {
    let mut r = reader(
        b"GET /path HTTP/1.1\r\nHost: example.com\r\nUser-Agent: test-client\r\nAccept: */*\r\n\r\n",
    );
    read_request_line(&mut r).await.unwrap();
    let block = read_header_block(&mut r).await.unwrap();

    assert_eq!(
        block,
        "Host: example.com\r\nUser-Agent: test-client\r\nAccept: */*"
    );
    let headers = HeaderMap::parse(&block);
    assert_eq!(headers.len(), 3);
    assert_eq!(headers.get("Accept"), Some("*/*"));
}

#[tokio::test]
async fn test_request_without_headers() {
    let mut r = reader(b"GET / HTTP/1.1\r\n\r\nx");

    read_request_line(&mut r).await.unwrap();
    assert_eq!(read_header_block(&mut r).await.unwrap(), "");
    assert_eq!(r.next_byte().await.unwrap(), Some(b'x'));
}

#[tokio::test]
async fn test_bare_cr_in_request_line_is_rejected() {
    let mut r = reader(b"GET / HTTP/1.1\rX\n");

    let err = read_request_line(&mut r).await.unwrap_err();
    assert!(matches!(err, HttpError::Protocol(_)));
}

#[tokio::test]
async fn test_incomplete_request_line() {
    let mut r = reader(b"GET / HTT");

    let err = read_request_line(&mut r).await.unwrap_err();
    assert!(matches!(err, HttpError::Protocol(_)));
}

#[tokio::test]
async fn test_incomplete_header_block() {
    let mut r = reader(b"GET / HTTP/1.1\r\nHost: example.com\r\n");

    read_request_line(&mut r).await.unwrap();
    let err = read_header_block(&mut r).await.unwrap_err();
    assert!(matches!(err, HttpError::Protocol(_)));
}

#[tokio::test]
async fn test_header_octets_are_latin1() {
    let mut r = reader(b"GET / HTTP/1.1\r\nX-Name: caf\xe9\r\n\r\n");

    read_request_line(&mut r).await.unwrap();
    let headers = HeaderMap::parse(&read_header_block(&mut r).await.unwrap());
    assert_eq!(headers.get("X-Name"), Some("caf\u{e9}"));
}

#[tokio::test]
async fn test_idle_connection_times_out() {
    let (_client, server) = tokio::io::duplex(64);
    let mut r = ByteReader::new(server, Duration::from_millis(20));

    let err = read_request_line(&mut r).await.unwrap_err();
    match err {
        HttpError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::TimedOut),
        other => panic!("expected a timeout, got {:?}", other),
    }
}
