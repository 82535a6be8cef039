//! SAC 公示平台 API 客户端
//!
//! 上游按浏览器指纹放行，两个接口都只能通过页面内的 fetch 调用，
//! 让请求继承真实浏览器的会话和 Cookie。

use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::{json, Value};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::browser::SacSession;
use crate::config::Config;

/// 人员列表查询接口路径
const PERSON_LIST_ENDPOINT: &str = "/publicity/getPersonListByName";
/// 人员详情查询接口路径
const PERSON_DETAIL_ENDPOINT: &str = "/publicity/getPersonDetail";

/// SAC API 客户端
///
/// 浏览器会话在第一次请求时才启动，之后一直复用。
/// 会话有导航状态，调用方必须串行使用。
pub struct SacClient {
    config: Config,
    session: Option<SacSession>,
}

impl SacClient {
    /// 创建新的客户端（不启动浏览器）
    pub fn new(config: Config) -> Self {
        Self {
            config,
            session: None,
        }
    }

    /// 接口1：通过姓名查询人员列表，返回所有结果字段
    ///
    /// 上游信封原样返回，不做字段筛选。传输/脚本异常折叠为
    /// `{"error": ...}`，只有浏览器启动失败才向上传播。
    pub async fn person_list_by_name(&mut self, name: &str, person_type: i64) -> Result<Value> {
        info!("[接口1] 查询姓名: {}", name);

        let form = json!({ "name": name, "type": person_type });
        let result = self.post_form(PERSON_LIST_ENDPOINT, form).await?;

        if Self::is_success(&result) {
            let count = Self::extract_person_list(&result).map_or(0, |list| list.len());
            info!("✓ 查询成功，找到 {} 个匹配的人员", count);
        } else if let Some(message) = result.get("message").and_then(|v| v.as_str()) {
            warn!("✗ 查询失败: {}", message);
        }

        Ok(result)
    }

    /// 接口2：通过 uuid 获取个人基本信息和登记变更记录
    ///
    /// 未知 uuid 会得到 `success=false` 加上游消息，而不是传输错误。
    pub async fn person_detail(&mut self, uuid: &str) -> Result<Value> {
        info!("[接口2] 查询UUID: {}", uuid);

        let form = json!({ "uuid": uuid });
        let result = self.post_form(PERSON_DETAIL_ENDPOINT, form).await?;

        if Self::is_success(&result) {
            info!("✓ 查询成功");
        } else if let Some(message) = result.get("message").and_then(|v| v.as_str()) {
            warn!("✗ 查询失败: {}", message);
        }

        Ok(result)
    }

    /// 关闭底层浏览器会话
    ///
    /// take() 保证重复调用也只关闭一次。
    pub async fn close(&mut self) {
        if let Some(session) = self.session.take() {
            if let Err(e) = session.close().await {
                warn!("关闭会话失败: {}", e);
            }
        }
    }

    /// 懒初始化浏览器会话
    async fn session(&mut self) -> Result<&SacSession> {
        if self.session.is_none() {
            info!("初始化SAC API客户端...");
            self.session = Some(SacSession::launch(&self.config).await?);
        }
        self.session.as_ref().context("会话未初始化")
    }

    /// 通过页面内 fetch 发送表单 POST
    ///
    /// 每次调用后都等待固定间隔（无论成败），避免触发上游频率防御。
    async fn post_form(&mut self, endpoint: &str, form: Value) -> Result<Value> {
        let script = self.build_fetch_script(endpoint, &form);
        let delay = Duration::from_secs(self.config.request_delay_secs);

        let session = self.session().await?;
        let outcome: Result<Value> = async {
            session.ensure_ready().await?;
            info!("发送API请求...");
            session.executor().eval(script).await
        }
        .await;

        // 添加延迟，避免请求过快
        sleep(delay).await;

        match outcome {
            Ok(result) => Ok(result),
            Err(e) => {
                let error_msg = format!("请求失败: {}", e);
                warn!("✗ {}", error_msg);
                Ok(json!({ "error": error_msg }))
            }
        }
    }

    /// 构建页面内 fetch 脚本
    ///
    /// 请求头模拟站内 XHR；表单体由页面内 URLSearchParams 编码。
    /// 页面内异常同样折叠为 `{error: ...}`，保证调用方拿到的永远是信封。
    fn build_fetch_script(&self, endpoint: &str, form: &Value) -> String {
        format!(
            r#"
            (async () => {{
                try {{
                    const res = await fetch("{base}{endpoint}", {{
                        method: "POST",
                        headers: {{
                            "Accept": "application/json, text/javascript, */*; q=0.01",
                            "Accept-Language": "zh-CN,zh;q=0.9,en;q=0.8",
                            "Content-Type": "application/x-www-form-urlencoded",
                            "X-Requested-With": "XMLHttpRequest",
                            "Origin": "{base}",
                            "Referer": "{referer}"
                        }},
                        body: new URLSearchParams({form}).toString()
                    }});
                    if (!res.ok) {{
                        throw new Error("HTTP error " + res.status);
                    }}
                    return await res.json();
                }} catch (err) {{
                    return {{ error: "请求失败: " + err.toString() }};
                }}
            }})()
            "#,
            base = self.config.sac_base_url,
            endpoint = endpoint,
            referer = self.config.landing_url(),
            form = form,
        )
    }

    /// 检查上游信封是否成功
    pub fn is_success(result: &Value) -> bool {
        result
            .get("success")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    /// 提取列表查询的人员数组（data.data）
    pub fn extract_person_list(result: &Value) -> Option<&Vec<Value>> {
        result
            .get("data")
            .and_then(|v| v.get("data"))
            .and_then(|v| v.as_array())
    }

    /// 提取详情查询的数据对象（data.data）
    pub fn extract_detail(result: &Value) -> Option<&Value> {
        result.get("data").and_then(|v| v.get("data"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> SacClient {
        SacClient::new(Config::default())
    }

    #[test]
    fn test_fetch_script_mimics_same_origin_xhr() {
        let client = test_client();
        let form = json!({ "name": "张三", "type": 1 });
        let script = client.build_fetch_script(PERSON_LIST_ENDPOINT, &form);

        assert!(script.contains("https://gs.sac.net.cn/publicity/getPersonListByName"));
        assert!(script.contains(r#""X-Requested-With": "XMLHttpRequest""#));
        assert!(script.contains(r#""Content-Type": "application/x-www-form-urlencoded""#));
        assert!(script.contains("sac-publicity-name.html"));
        assert!(script.contains("URLSearchParams"));
        assert!(script.contains("张三"));
    }

    #[test]
    fn test_fetch_script_fails_closed() {
        let client = test_client();
        let script = client.build_fetch_script(PERSON_DETAIL_ENDPOINT, &json!({ "uuid": "x" }));
        // 页面内异常必须折叠为 error 信封，而不是让 promise 失败
        assert!(script.contains("catch (err)"));
        assert!(script.contains(r#"error: "请求失败: " + err.toString()"#));
    }

    #[test]
    fn test_is_success() {
        assert!(SacClient::is_success(&json!({ "success": true })));
        assert!(!SacClient::is_success(&json!({ "success": false })));
        assert!(!SacClient::is_success(&json!({ "error": "请求失败" })));
        assert!(!SacClient::is_success(&json!({})));
    }

    #[test]
    fn test_extract_person_list() {
        let envelope = json!({
            "success": true,
            "code": 20000,
            "message": "成功",
            "data": { "data": [{ "uuid": "u1", "name": "张三" }] }
        });
        let list = SacClient::extract_person_list(&envelope).expect("应该有人员数组");
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["uuid"], "u1");

        // 失败信封没有 data.data
        assert!(SacClient::extract_person_list(&json!({ "error": "x" })).is_none());
    }

    #[test]
    fn test_extract_detail() {
        let envelope = json!({
            "success": true,
            "data": { "data": { "uuid": "u1", "regHistory": "[{\"status\":\"正常\"}]" } }
        });
        let detail = SacClient::extract_detail(&envelope).expect("应该有详情对象");
        // 登记变更记录保持为 JSON 字符串，原样透传
        assert!(detail["regHistory"].is_string());
    }
}
