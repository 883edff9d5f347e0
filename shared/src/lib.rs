//! Shared types for the cityhop admin panel
//!
//! Common types used by admin-server and the admin frontend: error codes,
//! response structures, and auth DTOs.

pub mod client;
pub mod error;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};

pub use client::{ActorInfo, LoginRequest, LoginResponse};
pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
