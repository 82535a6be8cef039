use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use sac_query_service::{handlers, logger, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logger::init();

    // 加载配置
    let config = Config::from_env();
    let port = config.port;
    let state = Arc::new(AppState::new(config));

    let app = handlers::router(state.clone());

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    log_startup(port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 退出前释放共享浏览器
    info!("关闭SAC API客户端...");
    state.sac.lock().await.close().await;
    info!("✓ 服务已退出");

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("\n正在关闭服务...");
}

fn log_startup(port: u16) {
    info!("{}", "=".repeat(60));
    info!("🚀 统一HTTP服务已启动");
    info!("{}", "=".repeat(60));
    info!("服务地址: http://localhost:{}", port);
    info!("健康检查: http://localhost:{}/health", port);
    info!("证券查询API:");
    info!("  - 搜索人员: http://localhost:{}/api/sac/search?name=<姓名>", port);
    info!("  - 查询详情: http://localhost:{}/api/sac/detail?uuid=<UUID>", port);
    info!("  - 完整查询: http://localhost:{}/api/sac/full?name=<姓名>", port);
    info!("PDF下载API:");
    info!("  - 下载PDF:  http://localhost:{}/api/pdf/download?url=<PDF_URL>", port);
    info!("{}", "=".repeat(60));
}
