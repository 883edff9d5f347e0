//! 审计日志 JSON diff 计算
//!
//! 通过比较更新前后的 JSON 值，自动生成变更差异。
//! 支持嵌套对象（角色的能力矩阵会展开成逐项变更）。
//! 浮点数使用容差比较避免精度问题。

use serde::Serialize;
use serde_json::{Value, json};
use std::collections::HashSet;

use super::types::AuditResource;

/// 浮点数比较容差 (用于处理序列化/反序列化精度损失)
const FLOAT_EPSILON: f64 = 1e-9;

/// 递归比较两个 JSON 值是否相等（浮点数使用容差比较）
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(fa), Some(fb)) => (fa - fb).abs() < FLOAT_EPSILON,
            _ => a == b,
        },
        (Value::Array(a), Value::Array(b)) => {
            if a.len() != b.len() {
                return false;
            }
            a.iter().zip(b.iter()).all(|(va, vb)| values_equal(va, vb))
        }
        (Value::Object(a), Value::Object(b)) => {
            if a.len() != b.len() {
                return false;
            }
            a.iter()
                .all(|(key, va)| b.get(key).is_some_and(|vb| values_equal(va, vb)))
        }
        _ => false,
    }
}

/// 字段变更记录
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FieldChange {
    /// 字段名（嵌套字段用点号路径，如 "capabilities.publish-content"）
    pub field: String,
    /// 变更前的值
    pub from: Value,
    /// 变更后的值
    pub to: Value,
}

/// 审计快照配置
#[derive(Debug, Clone)]
pub struct AuditConfig {
    /// 要排除的字段（如 "id", "secret_hash"）
    pub exclude_fields: &'static [&'static str],
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            exclude_fields: &["id"],
        }
    }
}

/// 获取资源的审计配置
pub fn get_config(resource: AuditResource) -> AuditConfig {
    match resource {
        // 账户快照绝不携带口令散列
        AuditResource::ActorOrRole => AuditConfig {
            exclude_fields: &["id", "secret_hash", "is_protected"],
        },
        _ => AuditConfig::default(),
    }
}

// ============================================================================
// JSON Diff 算法
// ============================================================================

/// 计算两个 JSON 值的差异（递归）
fn diff_json_recursive(from: &Value, to: &Value, path: &str, changes: &mut Vec<FieldChange>) {
    match (from, to) {
        // 两者都是对象 → 递归比较字段
        (Value::Object(from_obj), Value::Object(to_obj)) => {
            let mut all_keys: HashSet<&String> = from_obj.keys().collect();
            all_keys.extend(to_obj.keys());

            for key in all_keys {
                let field_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };

                match (from_obj.get(key), to_obj.get(key)) {
                    (Some(f), Some(t)) => {
                        diff_json_recursive(f, t, &field_path, changes);
                    }
                    (Some(f), None) => {
                        changes.push(FieldChange {
                            field: field_path,
                            from: f.clone(),
                            to: Value::Null,
                        });
                    }
                    (None, Some(t)) => {
                        changes.push(FieldChange {
                            field: field_path,
                            from: Value::Null,
                            to: t.clone(),
                        });
                    }
                    (None, None) => unreachable!(),
                }
            }
        }

        // 两者都是数组 → 整体比较
        (Value::Array(_), Value::Array(_)) => {
            if !values_equal(from, to) {
                changes.push(FieldChange {
                    field: path.to_string(),
                    from: from.clone(),
                    to: to.clone(),
                });
            }
        }

        // 两者都是数字 → 容差比较 (处理浮点数精度问题)
        (Value::Number(from_num), Value::Number(to_num)) => {
            let are_equal = match (from_num.as_f64(), to_num.as_f64()) {
                (Some(f), Some(t)) => (f - t).abs() < FLOAT_EPSILON,
                _ => from_num == to_num,
            };
            if !are_equal {
                changes.push(FieldChange {
                    field: path.to_string(),
                    from: from.clone(),
                    to: to.clone(),
                });
            }
        }

        // 其他基本类型 → 直接比较值
        (f, t) => {
            if f != t {
                changes.push(FieldChange {
                    field: path.to_string(),
                    from: f.clone(),
                    to: t.clone(),
                });
            }
        }
    }
}

/// 过滤 JSON 对象中的敏感字段
fn filter_fields(value: &mut Value, exclude: &[&str]) {
    if let Value::Object(obj) = value {
        for field in exclude {
            obj.remove(*field);
        }
    }
}

// ============================================================================
// 公共 API
// ============================================================================

/// 创建 CREATE 操作的审计详情（快照）
///
/// 返回过滤掉敏感字段后的完整快照。
pub fn create_snapshot<T: Serialize>(value: &T, resource: AuditResource) -> Value {
    let config = get_config(resource);

    match serde_json::to_value(value) {
        Ok(mut json) => {
            filter_fields(&mut json, config.exclude_fields);
            json
        }
        Err(e) => {
            tracing::error!("Failed to serialize audit snapshot: {:?}", e);
            json!({"error": "serialization_failed"})
        }
    }
}

/// 创建 UPDATE 操作的审计详情（差异）
///
/// 返回格式：`{"changes": [{"field": "name", "from": "A", "to": "B"}, ...]}`
pub fn create_diff<T: Serialize>(from: &T, to: &T, resource: AuditResource) -> Value {
    let config = get_config(resource);

    let from_json = match serde_json::to_value(from) {
        Ok(mut v) => {
            filter_fields(&mut v, config.exclude_fields);
            v
        }
        Err(e) => {
            tracing::error!("Failed to serialize 'from' for diff: {:?}", e);
            return json!({"error": "serialization_failed"});
        }
    };

    let to_json = match serde_json::to_value(to) {
        Ok(mut v) => {
            filter_fields(&mut v, config.exclude_fields);
            v
        }
        Err(e) => {
            tracing::error!("Failed to serialize 'to' for diff: {:?}", e);
            return json!({"error": "serialization_failed"});
        }
    };

    let mut changes = Vec::new();
    diff_json_recursive(&from_json, &to_json, "", &mut changes);

    if changes.is_empty() {
        json!({"changes": [], "note": "no_changes_detected"})
    } else {
        json!({"changes": changes})
    }
}

/// 创建 DELETE 操作的审计详情（标识符）
pub fn create_delete_details(name: &str) -> Value {
    json!({"name": name})
}
