//! # SAC Query Service
//!
//! 证券从业人员信息查询与 PDF 下载统一 HTTP 服务
//!
//! 上游官网 (<https://gs.sac.net.cn>) 按浏览器指纹拦截自动化客户端，
//! 因此所有数据请求都必须从真实浏览器的执行环境内发起，
//! 而不能使用进程外的 HTTP 客户端。
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `JsExecutor` - 唯一的 page owner，提供 eval() 能力
//!
//! ### ② 浏览器层（Browser）
//! - `browser/stealth` - 带反检测配置的浏览器启动
//! - `browser/session` - SAC 站点的长生命周期会话（预热 + 复用）
//!
//! ### ③ 客户端层（Clients）
//! - `clients/sac_client` - 通过页面内 fetch 调用上游两个接口
//!
//! ### ④ 业务层（Services）
//! - `services/person_service` - 姓名列表 + 逐人详情的聚合查询
//! - `services/pdf_service` - 一次性浏览器实例的 PDF 下载代理
//!
//! ### ⑤ 接口层（Handlers）
//! - `handlers` - axum 路由，把 HTTP 请求翻译为上述能力调用

pub mod browser;
pub mod clients;
pub mod config;
pub mod error;
pub mod handlers;
pub mod infrastructure;
pub mod logger;
pub mod services;

// 重新导出常用类型
pub use clients::SacClient;
pub use config::Config;
pub use error::AppError;
pub use handlers::{router, AppState};
pub use infrastructure::JsExecutor;
