//! SAC 站点的长生命周期浏览器会话
//!
//! 启动浏览器开销很大，所以整个进程只维护一个会话，
//! 由上层串行复用。

use std::time::Duration;

use anyhow::Result;
use chromiumoxide::Browser;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::browser::stealth::launch_stealth_browser;
use crate::config::Config;
use crate::infrastructure::JsExecutor;

/// SAC 查询会话
///
/// 持有一个长生命周期的浏览器实例。数据请求前必须调用
/// `ensure_ready` 完成一次落地页预热，否则上游会直接拒绝。
pub struct SacSession {
    browser: Browser,
    executor: JsExecutor,
    base_url: String,
    landing_url: String,
    warm_up: Duration,
}

impl SacSession {
    /// 启动新的查询会话
    pub async fn launch(config: &Config) -> Result<Self> {
        let (browser, page) = launch_stealth_browser(config, &[]).await?;
        Ok(Self {
            browser,
            executor: JsExecutor::new(page),
            base_url: config.sac_base_url.clone(),
            landing_url: config.landing_url(),
            warm_up: Duration::from_secs(config.warm_up_secs),
        })
    }

    /// 确保会话已经准备好，通过反爬虫检测
    ///
    /// 若当前页面已在 SAC 站点内则直接返回；
    /// 否则访问落地页并等待固定时间，让指纹/Cookie 脚本执行完毕。
    /// 页面因任何原因离开站点后，下一次调用会重新预热。
    pub async fn ensure_ready(&self) -> Result<()> {
        let current_url = self.executor.page().url().await?.unwrap_or_default();
        if current_url.starts_with(&self.base_url) {
            debug!("会话已就绪: {}", current_url);
            return Ok(());
        }

        info!("初始化会话，访问主页...");
        self.executor.page().goto(self.landing_url.as_str()).await?;
        info!("等待反爬虫检测...");
        sleep(self.warm_up).await;
        Ok(())
    }

    /// 获取 JS 执行器
    pub fn executor(&self) -> &JsExecutor {
        &self.executor
    }

    /// 关闭浏览器
    ///
    /// 按值消耗会话，保证底层进程只会被终止一次。
    pub async fn close(mut self) -> Result<()> {
        if let Err(e) = self.browser.close().await {
            warn!("关闭浏览器失败: {}", e);
        }
        self.browser.wait().await?;
        info!("✓ 浏览器已关闭");
        Ok(())
    }
}
