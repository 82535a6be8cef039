//! 带反检测配置的浏览器启动
//!
//! 上游站点会检查 navigator.webdriver、插件列表和语言指纹，
//! 所以每个实例在导航前都要注入隐藏脚本。

use std::path::Path;

use anyhow::Result;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::config::Config;

/// 在每个新文档执行前注入的反检测脚本
///
/// 隐藏 webdriver 特征，伪造插件和语言列表
const STEALTH_SCRIPT: &str = r#"
    Object.defineProperty(navigator, 'webdriver', {
        get: () => undefined
    });
    Object.defineProperty(navigator, 'plugins', {
        get: () => [1, 2, 3, 4, 5]
    });
    Object.defineProperty(navigator, 'languages', {
        get: () => ["zh-CN", "zh", "en"]
    });
"#;

/// 启动带反检测配置的浏览器，并返回一个已注入隐藏脚本的空白页面
///
/// # 参数
/// - `config`: 程序配置（无头模式、User-Agent、可执行文件路径）
/// - `extra_args`: 附加的 Chrome 启动参数（PDF 下载需要忽略证书错误等）
pub async fn launch_stealth_browser(
    config: &Config,
    extra_args: &[&str],
) -> Result<(Browser, Page)> {
    info!("🚀 启动浏览器...");

    let mut args: Vec<String> = vec![
        "--no-sandbox".to_string(),
        "--disable-gpu".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-blink-features=AutomationControlled".to_string(),
        format!("--user-agent={}", config.user_agent),
    ];
    args.extend(extra_args.iter().map(|s| s.to_string()));
    debug!("启动参数: {:?}", args);

    let mut builder = BrowserConfig::builder();
    if config.headless {
        builder = builder.new_headless_mode();
    } else {
        builder = builder.with_head();
    }
    if let Some(chrome_path) = &config.chrome_path {
        builder = builder.chrome_executable(Path::new(chrome_path));
    }

    let browser_config = builder.args(args).build().map_err(|e| {
        error!("配置浏览器失败: {}", e);
        anyhow::anyhow!("配置浏览器失败: {}", e)
    })?;

    // 启动浏览器
    let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        anyhow::anyhow!("启动浏览器失败: {}", e)
    })?;
    debug!("浏览器启动成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建页面失败: {}", e);
        anyhow::anyhow!("创建页面失败: {}", e)
    })?;

    // 隐藏 webdriver 特征
    let stealth = AddScriptToEvaluateOnNewDocumentParams::builder()
        .source(STEALTH_SCRIPT)
        .build()
        .map_err(|e| anyhow::anyhow!("构造反检测脚本失败: {}", e))?;
    page.execute(stealth).await.map_err(|e| {
        error!("注入反检测脚本失败: {}", e);
        anyhow::anyhow!("注入反检测脚本失败: {}", e)
    })?;

    info!("✓ 浏览器已就绪");
    Ok((browser, page))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stealth_script_covers_fingerprint_fields() {
        assert!(STEALTH_SCRIPT.contains("webdriver"));
        assert!(STEALTH_SCRIPT.contains("plugins"));
        assert!(STEALTH_SCRIPT.contains("languages"));
        assert!(STEALTH_SCRIPT.contains("zh-CN"));
    }
}
