//! HTTP/1.1 protocol layer.
//!
//! One request per connection, always answered with `Connection: close`.
//!
//! # Architecture
//!
//! - **`connection`**: per-connection state machine, from request line to close
//! - **`stream`**: buffered byte reader with per-read idle timeouts
//! - **`parser`**: request line and header block recognizers
//! - **`request`**: method and request-line parsing
//! - **`headers`**: case-sensitive header map with comma folding
//! - **`boundary`**: streaming delimiter search used by multipart decoding
//! - **`response`**: status codes, in-memory responses and the HTML page
//! - **`writer`**: response framing and streamed bodies
//! - **`date`**: HTTP date formatting and parsing
//! - **`mime`**: content type lookup by file suffix
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌────────────────────┐
//!        │ ReadingRequestLine │ ← line up to CRLF, split into 3 tokens
//!        └─────────┬──────────┘
//!                  │ method, target, version
//!                  ▼
//!        ┌────────────────────┐
//!        │      Routing       │ ← GET / POST / anything else
//!        └─────────┬──────────┘
//!                  ▼
//!        ┌────────────────────┐
//!        │   HandlingMethod   │ ← handler reads headers + body, writes one response
//!        └─────────┬──────────┘
//!                  ▼
//!        ┌────────────────────┐
//!        │      Cleanup       │ ← flush, close output, close input, close socket
//!        └────────────────────┘
//! ```
//!
//! A protocol error anywhere before cleanup sends a 400 and goes straight to
//! `Cleanup`; a transport error skips the response.

pub mod boundary;
pub mod connection;
pub mod date;
pub mod error;
pub mod headers;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod stream;
pub mod writer;
