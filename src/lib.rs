//! Portico - a small static file and upload server
//!
//! Serves files and directory listings over GET and stores multipart
//! uploads over POST, one request per connection.

pub mod config;
pub mod handlers;
pub mod http;
pub mod server;
