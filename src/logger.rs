//! 日志初始化
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// 初始化 tracing 日志
///
/// 默认级别可通过 RUST_LOG 覆盖。重复调用（测试场景）是无害的。
pub fn init() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sac_query_service=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
