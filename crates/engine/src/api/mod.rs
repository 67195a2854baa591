//! API layer - HTTP routes and the SSE presence stream.

pub mod http;
pub mod presence_stream;
