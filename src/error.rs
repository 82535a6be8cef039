use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::services::pdf_service::DownloadError;

/// 应用程序错误类型
///
/// 只有需要映射为 HTTP 响应的错误才会出现在这里。
/// 页面内脚本/传输失败不属于此类：客户端层把它们折叠进
/// `{"error": ...}` 信封原样返回（HTTP 200）。
#[derive(Debug)]
pub enum AppError {
    /// 缺少必填请求参数
    MissingParam {
        param: &'static str,
        usage: Value,
    },
    /// PDF 下载失败
    Download(DownloadError),
    /// 其他内部错误（浏览器启动失败等）
    Internal(anyhow::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::MissingParam { param, .. } => write!(f, "缺少参数: {}", param),
            AppError::Download(e) => write!(f, "PDF下载失败: {}", e),
            AppError::Internal(e) => write!(f, "服务器内部错误: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Download(e) => Some(e),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::MissingParam { param, usage } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "success": false,
                    "error": format!("缺少参数: {}", param),
                    "usage": usage,
                }),
            ),
            AppError::Download(e) => {
                tracing::error!("[PDF下载] 错误: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "success": false,
                        "error": "PDF下载失败",
                        "message": e.to_string(),
                    }),
                )
            }
            AppError::Internal(e) => {
                // 详细错误只进日志，不回传调用方
                tracing::error!("内部错误: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "success": false,
                        "error": "服务器内部错误",
                        "message": e.to_string(),
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl From<DownloadError> for AppError {
    fn from(err: DownloadError) -> Self {
        AppError::Download(err)
    }
}
