//! 完整查询服务
//!
//! 组合客户端的两个接口：先按姓名查列表，再逐人查详情。

use anyhow::Result;
use serde_json::{json, Value};
use tracing::info;

use crate::clients::SacClient;

/// 完整查询：先通过姓名查询列表，再获取每个人的详细信息
///
/// 列表查询失败时短路返回 `{name, error, persons: []}`。
/// 单个详情失败只把该人的 detail 记为 null，不中断其余查询。
/// total 是处理过的人员数量，不是详情成功的数量。
pub async fn query_full_info(client: &mut SacClient, name: &str) -> Result<Value> {
    info!("[完整查询] 姓名: {}", name);

    // 第一步：查询姓名列表
    let list_result = client.person_list_by_name(name, 1).await?;

    if let Some(error) = list_failure(&list_result) {
        return Ok(json!({
            "name": name,
            "error": error,
            "persons": [],
        }));
    }

    let person_list: Vec<Value> = SacClient::extract_person_list(&list_result)
        .cloned()
        .unwrap_or_default();

    // 第二步：逐个查询详细信息（会话有状态，必须串行）
    let total = person_list.len();
    let mut persons = Vec::with_capacity(total);
    for (index, person) in person_list.into_iter().enumerate() {
        let uuid = person
            .get("uuid")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        info!("查询第 {}/{} 个人员的详情 (UUID: {})", index + 1, total, uuid);

        let detail_result = client.person_detail(&uuid).await?;
        persons.push(json!({
            "basic": person,
            "detail": detail_payload(&detail_result),
        }));
    }

    Ok(json!({
        "name": name,
        "total": persons.len(),
        "persons": persons,
    }))
}

/// 判断列表查询是否失败，失败时给出对外的错误信息
///
/// 传输错误优先取 error 字段，业务失败取上游 message。
fn list_failure(list_result: &Value) -> Option<Value> {
    if list_result.get("error").is_none() && SacClient::is_success(list_result) {
        return None;
    }
    Some(
        list_result
            .get("error")
            .or_else(|| list_result.get("message"))
            .cloned()
            .unwrap_or(Value::Null),
    )
}

/// 取出要配对的详情数据，失败记为 null
fn detail_payload(detail_result: &Value) -> Value {
    if SacClient::is_success(detail_result) {
        SacClient::extract_detail(detail_result)
            .cloned()
            .unwrap_or(Value::Null)
    } else {
        Value::Null
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_failure_on_transport_error() {
        let result = json!({ "error": "请求失败: timeout" });
        assert_eq!(list_failure(&result), Some(json!("请求失败: timeout")));
    }

    #[test]
    fn test_list_failure_on_business_failure() {
        let result = json!({ "success": false, "message": "查询无结果" });
        assert_eq!(list_failure(&result), Some(json!("查询无结果")));
    }

    #[test]
    fn test_list_success_passes() {
        let result = json!({ "success": true, "data": { "data": [] } });
        assert_eq!(list_failure(&result), None);
    }

    #[test]
    fn test_detail_payload_null_on_failure() {
        let failed = json!({ "success": false, "message": "无此人员" });
        assert_eq!(detail_payload(&failed), Value::Null);

        let error = json!({ "error": "请求失败: x" });
        assert_eq!(detail_payload(&error), Value::Null);
    }

    #[test]
    fn test_detail_payload_extracts_data() {
        let ok = json!({ "success": true, "data": { "data": { "uuid": "u1" } } });
        assert_eq!(detail_payload(&ok), json!({ "uuid": "u1" }));
    }
}
