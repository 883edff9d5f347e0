//! 认证与授权模块
//!
//! - [`session`]: 会话令牌的签发与校验
//! - [`engine`]: 账户加载与角色解析
//! - [`capability`]: 封闭的能力枚举与角色矩阵
//! - [`middleware`] / [`extractor`]: Axum 集成

pub mod capability;
pub mod engine;
pub mod extractor;
pub mod middleware;
pub mod session;

pub use capability::{ALL_CAPABILITIES, Capability, CapabilitySet};
pub use engine::{AuthEngine, AuthError, CurrentActor, RoleResolution};
pub use middleware::{require_capability, require_session};
pub use session::{SESSION_COOKIE, SessionConfig, SessionService};
