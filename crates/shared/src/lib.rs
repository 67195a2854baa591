//! Adventure Terminal Protocol - Shared types for the engine and its clients
//!
//! This crate contains the wire-format types exchanged over HTTP:
//! - Server-push presence frames (`text/event-stream` payloads)
//! - Request and response bodies for the movement endpoints
//! - The error body returned by every failing endpoint
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - Only serde, serde_json and the domain crate
//! 2. **No business logic** - Pure data types and serialization
//! 3. **Raw ids in DTOs** - cell and user ids are plain strings

pub mod requests;
pub mod responses;
pub mod stream;

pub use requests::{CreateUserRequest, MoveRequest, TeleportRequest};
pub use responses::{
    BridgeStatusResponse, CreateUserResponse, ErrorResponse, MoveResponse, TeleportResponse,
    UserData, WorldCellData,
};
pub use stream::{ConnectedFrame, PresenceFrame};
