//! HTTP 接口层
//!
//! 路由一一对应底层能力：SAC 查询走共享浏览器会话（互斥锁串行），
//! PDF 下载每次独立实例，互不影响。
//! 参数可以来自 GET 查询串或 POST JSON 体，查询串优先。

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::info;
use url::Url;

use crate::clients::SacClient;
use crate::config::Config;
use crate::error::AppError;
use crate::services::{pdf_service, person_service};

/// 共享应用状态
pub struct AppState {
    /// 共享的 SAC 客户端。浏览器会话有导航状态，
    /// 整个请求期间都要持有锁，保证串行访问。
    pub sac: Mutex<SacClient>,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            sac: Mutex::new(SacClient::new(config.clone())),
            config,
        }
    }
}

/// 构建全部路由
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health).post(health))
        .route("/health", get(health).post(health))
        .route("/api/sac/search", get(sac_search).post(sac_search))
        .route("/api/sac/detail", get(sac_detail).post(sac_detail))
        .route("/api/sac/full", get(sac_full).post(sac_full))
        .route("/api/pdf/download", get(pdf_download).post(pdf_download))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub person_type: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DetailParams {
    pub uuid: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DownloadParams {
    pub url: Option<String>,
}

/// 健康检查
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "统一HTTP服务运行中",
        "services": {
            "sac_query": {
                "name": "证券从业人员查询",
                "endpoints": [
                    "/api/sac/search",
                    "/api/sac/detail",
                    "/api/sac/full",
                ],
            },
            "pdf_download": {
                "name": "PDF下载代理",
                "endpoints": [
                    "/api/pdf/download",
                ],
            },
        },
        "timestamp": chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    }))
}

/// 证券从业人员查询 - 按姓名搜索
pub async fn sac_search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchParams>,
    body: Option<Json<SearchParams>>,
) -> Result<Json<Value>, AppError> {
    let body = body.map(|Json(p)| p).unwrap_or_default();
    let name = query
        .name
        .or(body.name)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| missing_param("/api/sac/search", "name", "姓名"))?;
    let person_type = query.person_type.or(body.person_type).unwrap_or(1);

    info!("[SAC搜索] 姓名: {}", name);

    let mut client = state.sac.lock().await;
    let result = client.person_list_by_name(&name, person_type).await?;
    Ok(Json(result))
}

/// 证券从业人员详情 - 按 UUID 查询
pub async fn sac_detail(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DetailParams>,
    body: Option<Json<DetailParams>>,
) -> Result<Json<Value>, AppError> {
    let body = body.map(|Json(p)| p).unwrap_or_default();
    let uuid = query
        .uuid
        .or(body.uuid)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| missing_param("/api/sac/detail", "uuid", "UUID"))?;

    info!("[SAC详情] UUID: {}", uuid);

    let mut client = state.sac.lock().await;
    let result = client.person_detail(&uuid).await?;
    Ok(Json(result))
}

/// 证券从业人员完整信息 - 按姓名查询所有详情
pub async fn sac_full(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchParams>,
    body: Option<Json<SearchParams>>,
) -> Result<Json<Value>, AppError> {
    let body = body.map(|Json(p)| p).unwrap_or_default();
    let name = query
        .name
        .or(body.name)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| missing_param("/api/sac/full", "name", "姓名"))?;

    info!("[SAC完整查询] 姓名: {}", name);

    let mut client = state.sac.lock().await;
    let result = person_service::query_full_info(&mut client, &name).await?;
    Ok(Json(result))
}

/// PDF 下载代理，返回原始文件内容
pub async fn pdf_download(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DownloadParams>,
    body: Option<Json<DownloadParams>>,
) -> Result<Response, AppError> {
    let body = body.map(|Json(p)| p).unwrap_or_default();
    let url = query
        .url
        .or(body.url)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| missing_param("/api/pdf/download", "url", "PDF_URL"))?;

    info!("[PDF下载] URL: {}", url);

    let content = pdf_service::download_pdf(&state.config, &url).await?;
    let filename = filename_from_url(&url);
    info!("[PDF下载] 成功: {}, {} bytes", filename, content.len());

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (header::CONTENT_DISPOSITION, content_disposition(&filename)),
    ];
    Ok((headers, content).into_response())
}

/// 缺少必填参数的 400 响应，附带调用示例
fn missing_param(route: &'static str, param: &'static str, placeholder: &'static str) -> AppError {
    AppError::MissingParam {
        param,
        usage: json!({
            "GET": format!("{}?{}=<{}>", route, param, placeholder),
            "POST": format!("{} with JSON {{\"{}\": \"<{}>\"}}", route, param, placeholder),
        }),
    }
}

/// 从 URL 路径推导下载文件名，无 .pdf 后缀时补上
fn filename_from_url(url: &str) -> String {
    let name = Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments().and_then(|segments| {
                segments
                    .filter(|s| !s.is_empty())
                    .last()
                    .map(str::to_string)
            })
        })
        .map(|s| percent_decode_str(&s).decode_utf8_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "download".to_string());

    if name.ends_with(".pdf") {
        name
    } else {
        format!("{}.pdf", name)
    }
}

/// Content-Disposition 头：非 ASCII 文件名按 RFC 5987 编码
fn content_disposition(filename: &str) -> String {
    if filename.is_ascii() {
        format!("attachment; filename=\"{}\"", filename)
    } else {
        format!(
            "attachment; filename*=UTF-8''{}",
            utf8_percent_encode(filename, NON_ALPHANUMERIC)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_from_url_plain() {
        assert_eq!(
            filename_from_url("https://example.com/files/report.pdf"),
            "report.pdf"
        );
    }

    #[test]
    fn test_filename_from_url_appends_suffix() {
        assert_eq!(
            filename_from_url("https://example.com/files/notice"),
            "notice.pdf"
        );
    }

    #[test]
    fn test_filename_from_url_decodes_percent_encoding() {
        assert_eq!(
            filename_from_url("https://example.com/%E5%85%AC%E5%91%8A.pdf"),
            "公告.pdf"
        );
    }

    #[test]
    fn test_filename_from_url_ignores_query_string() {
        assert_eq!(
            filename_from_url("https://example.com/a/b.pdf?token=xyz"),
            "b.pdf"
        );
    }

    #[test]
    fn test_filename_from_url_fallback() {
        assert_eq!(filename_from_url("https://example.com/"), "download.pdf");
        assert_eq!(filename_from_url("not a url"), "download.pdf");
    }

    #[test]
    fn test_content_disposition_ascii() {
        assert_eq!(
            content_disposition("report.pdf"),
            "attachment; filename=\"report.pdf\""
        );
    }

    #[test]
    fn test_content_disposition_non_ascii_is_header_safe() {
        let value = content_disposition("公告.pdf");
        assert!(value.starts_with("attachment; filename*=UTF-8''"));
        assert!(value.is_ascii());
    }

    #[test]
    fn test_missing_param_usage_hint() {
        let err = missing_param("/api/sac/search", "name", "姓名");
        match err {
            AppError::MissingParam { param, usage } => {
                assert_eq!(param, "name");
                assert_eq!(usage["GET"], "/api/sac/search?name=<姓名>");
            }
            other => panic!("意外的错误类型: {:?}", other),
        }
    }
}
