//! Capability Definitions
//!
//! 权限能力采用封闭枚举：新增能力是编译错误，所有匹配点都必须处理。
//!
//! ## 设计原则
//! - 角色携带 capability -> bool 的矩阵；缺失的条目一律视为拒绝
//! - `is-super-admin` 是元标记：角色上的 `is_super_admin` 短路所有检查
//! - 线上格式固定为 kebab-case 字符串（"view-content" 等）

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// 单项能力标记
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    // === 内容 ===
    ViewContent,
    CreateContent,
    EditContent,
    DeleteContent,
    PublishContent,

    // === 账户与角色 ===
    ViewActors,
    CreateActor,
    EditActor,
    DeleteActor,
    AssignRole,

    // === 站点资源 ===
    ManageCategories,
    ManageTags,
    ManageMedia,
    ManageRoutes,
    ManageCities,
    ManageAirports,
    ManageSeo,

    // === 预订 ===
    ViewBookings,
    ManageBookings,

    // === 系统 ===
    ManageSettings,
    ViewAuditLog,

    /// 元标记：对应角色上的 `is_super_admin`
    IsSuperAdmin,
}

/// 全部能力（含元标记），顺序与 API 列表一致
pub const ALL_CAPABILITIES: &[Capability] = &[
    Capability::ViewContent,
    Capability::CreateContent,
    Capability::EditContent,
    Capability::DeleteContent,
    Capability::PublishContent,
    Capability::ViewActors,
    Capability::CreateActor,
    Capability::EditActor,
    Capability::DeleteActor,
    Capability::AssignRole,
    Capability::ManageCategories,
    Capability::ManageTags,
    Capability::ManageMedia,
    Capability::ManageRoutes,
    Capability::ManageCities,
    Capability::ManageAirports,
    Capability::ManageSeo,
    Capability::ViewBookings,
    Capability::ManageBookings,
    Capability::ManageSettings,
    Capability::ViewAuditLog,
    Capability::IsSuperAdmin,
];

impl Capability {
    /// 线上字符串 (kebab-case)，与 serde 表示一致
    pub const fn as_str(&self) -> &'static str {
        match self {
            Capability::ViewContent => "view-content",
            Capability::CreateContent => "create-content",
            Capability::EditContent => "edit-content",
            Capability::DeleteContent => "delete-content",
            Capability::PublishContent => "publish-content",
            Capability::ViewActors => "view-actors",
            Capability::CreateActor => "create-actor",
            Capability::EditActor => "edit-actor",
            Capability::DeleteActor => "delete-actor",
            Capability::AssignRole => "assign-role",
            Capability::ManageCategories => "manage-categories",
            Capability::ManageTags => "manage-tags",
            Capability::ManageMedia => "manage-media",
            Capability::ManageRoutes => "manage-routes",
            Capability::ManageCities => "manage-cities",
            Capability::ManageAirports => "manage-airports",
            Capability::ManageSeo => "manage-seo",
            Capability::ViewBookings => "view-bookings",
            Capability::ManageBookings => "manage-bookings",
            Capability::ManageSettings => "manage-settings",
            Capability::ViewAuditLog => "view-audit-log",
            Capability::IsSuperAdmin => "is-super-admin",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Capability {
    type Err = UnknownCapability;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_CAPABILITIES
            .iter()
            .copied()
            .find(|cap| cap.as_str() == s)
            .ok_or_else(|| UnknownCapability(s.to_string()))
    }
}

/// 不在封闭枚举内的能力名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCapability(pub String);

impl fmt::Display for UnknownCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown capability: {}", self.0)
    }
}

impl std::error::Error for UnknownCapability {}

/// 角色的能力矩阵
///
/// 存储为 capability -> bool 映射；缺失条目等同于 false (默认拒绝)。
/// 序列化为 JSON 对象，如 `{"view-content": true, "publish-content": false}`。
/// 键手动走 `as_str()`：SurrealDB 的值序列化器只接受字符串键，
/// 枚举变体做键会在写库时被整条拒绝。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet(BTreeMap<Capability, bool>);

impl Serialize for CapabilitySet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (capability, allowed) in &self.0 {
            map.serialize_entry(capability.as_str(), allowed)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CapabilitySet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = BTreeMap::<String, bool>::deserialize(deserializer)?;
        let mut entries = BTreeMap::new();
        for (name, allowed) in raw {
            let capability: Capability = name.parse().map_err(serde::de::Error::custom)?;
            entries.insert(capability, allowed);
        }
        Ok(Self(entries))
    }
}

impl CapabilitySet {
    /// 创建空矩阵（一切拒绝）
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// 授予能力（builder 风格）
    pub fn grant(mut self, capability: Capability) -> Self {
        self.0.insert(capability, true);
        self
    }

    /// 显式拒绝能力（builder 风格）
    ///
    /// 与缺失条目行为相同；显式 false 用于让角色定义自说明。
    pub fn deny(mut self, capability: Capability) -> Self {
        self.0.insert(capability, false);
        self
    }

    /// 设置单项能力
    pub fn set(&mut self, capability: Capability, allowed: bool) {
        self.0.insert(capability, allowed);
    }

    /// 查询能力；缺失条目返回 false
    pub fn allows(&self, capability: Capability) -> bool {
        self.0.get(&capability).copied().unwrap_or(false)
    }

    /// 已授予（值为 true）的能力
    pub fn granted(&self) -> impl Iterator<Item = Capability> + '_ {
        self.0
            .iter()
            .filter(|(_, allowed)| **allowed)
            .map(|(cap, _)| *cap)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Capability, bool)> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = (Capability, bool)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
