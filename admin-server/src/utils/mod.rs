//! 工具模块 - 通用工具函数和类型
//!
//! # 内容
//!
//! - [`AppError`] / [`ApiResponse`] - 统一错误类型 (from shared::error)
//! - [`logger`] - tracing 初始化
//! - [`slug`] - 角色 slug 生成

pub mod logger;
pub mod slug;

// Re-export error types from shared so handlers only import crate::utils
pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
