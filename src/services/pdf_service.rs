//! PDF 下载代理服务
//!
//! 用真实浏览器下载 PDF，绕过各种反爬措施。
//! 每次调用都创建独立的浏览器实例和私有下载目录，
//! 并发下载之间互不干扰。

use std::path::{Path, PathBuf};
use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::browser::{
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::Page;
use thiserror::Error;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::browser::stealth::launch_stealth_browser;
use crate::config::Config;

/// 目标 URL 可能是任意站点，证书配置不可信
const PDF_BROWSER_ARGS: &[&str] = &[
    "--ignore-certificate-errors",
    "--ignore-ssl-errors",
    "--allow-running-insecure-content",
    "--window-size=1920,1080",
];

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("浏览器启动失败: {0}")]
    Launch(String),

    #[error("设置下载行为失败: {0}")]
    DownloadBehavior(String),

    #[error("下载超时（{secs}秒）")]
    Timeout { secs: u64 },

    #[error("文件操作失败: {0}")]
    Io(#[from] std::io::Error),
}

/// 使用浏览器下载 PDF，返回文件内容
///
/// 浏览器实例和临时目录都在本次调用内独占，
/// 任何退出路径都会关闭浏览器并删除目录。
pub async fn download_pdf(config: &Config, url: &str) -> Result<Vec<u8>, DownloadError> {
    let download_dir = tempfile::Builder::new()
        .prefix("pdf_download_")
        .tempdir()?;
    info!("[PDF] 创建下载目录: {}", download_dir.path().display());

    let (mut browser, page) = launch_stealth_browser(config, PDF_BROWSER_ARGS)
        .await
        .map_err(|e| DownloadError::Launch(e.to_string()))?;

    let result = run_download(config, &page, url, download_dir.path()).await;

    // 无论成败都要关闭浏览器；临时目录随 drop 递归删除
    if let Err(e) = browser.close().await {
        warn!("[PDF] 关闭浏览器失败: {}", e);
    }
    if let Err(e) = browser.wait().await {
        warn!("[PDF] 等待浏览器退出失败: {}", e);
    }

    result
}

async fn run_download(
    config: &Config,
    page: &Page,
    url: &str,
    download_dir: &Path,
) -> Result<Vec<u8>, DownloadError> {
    // 下载直接落到私有目录，不弹窗、不预览
    let behavior = SetDownloadBehaviorParams::builder()
        .behavior(SetDownloadBehaviorBehavior::Allow)
        .download_path(download_dir.to_string_lossy().to_string())
        .build()
        .map_err(DownloadError::DownloadBehavior)?;
    page.execute(behavior)
        .await
        .map_err(|e| DownloadError::DownloadBehavior(e.to_string()))?;

    info!("[PDF] 导航到: {}", url);
    if let Err(e) = page.goto(url).await {
        // 触发下载时导航会被浏览器中断，属于预期行为
        debug!("[PDF] 导航被中断: {}", e);
    }

    info!("[PDF] 等待下载完成...");
    let file_path = wait_for_download(
        download_dir,
        Duration::from_secs(config.download_timeout_secs),
        Duration::from_millis(config.download_poll_interval_ms),
    )
    .await?;
    info!("[PDF] 下载完成: {}", file_path.display());

    // 确保文件写入完成
    sleep(Duration::from_millis(config.download_settle_ms)).await;

    let content = tokio::fs::read(&file_path).await?;
    info!("[PDF] 文件大小: {} bytes", content.len());
    Ok(content)
}

/// 轮询下载目录，等待第一个写入完成的文件
async fn wait_for_download(
    download_dir: &Path,
    timeout: Duration,
    interval: Duration,
) -> Result<PathBuf, DownloadError> {
    let deadline = Instant::now() + timeout;

    loop {
        if let Some(path) = find_completed_file(download_dir)? {
            return Ok(path);
        }
        if Instant::now() >= deadline {
            return Err(DownloadError::Timeout {
                secs: timeout.as_secs(),
            });
        }
        sleep(interval).await;
    }
}

fn find_completed_file(download_dir: &Path) -> Result<Option<PathBuf>, DownloadError> {
    for entry in std::fs::read_dir(download_dir)? {
        let entry = entry?;
        let file_name = entry.file_name();
        if is_completed_candidate(&file_name.to_string_lossy()) {
            return Ok(Some(entry.path()));
        }
    }
    Ok(None)
}

/// 过滤掉下载中的临时文件和隐藏文件
fn is_completed_candidate(name: &str) -> bool {
    !name.ends_with(".crdownload") && !name.ends_with(".tmp") && !name.starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_completed_candidate_filter() {
        assert!(is_completed_candidate("report.pdf"));
        assert!(is_completed_candidate("公告全文"));
        assert!(!is_completed_candidate("report.pdf.crdownload"));
        assert!(!is_completed_candidate("report.tmp"));
        assert!(!is_completed_candidate(".DS_Store"));
    }

    #[test]
    fn test_find_completed_file_skips_partials() {
        let dir = tempfile::tempdir().expect("创建临时目录失败");
        fs::write(dir.path().join("a.pdf.crdownload"), b"partial").unwrap();
        fs::write(dir.path().join(".hidden"), b"x").unwrap();
        assert!(find_completed_file(dir.path()).unwrap().is_none());

        fs::write(dir.path().join("a.pdf"), b"%PDF-1.4").unwrap();
        let found = find_completed_file(dir.path()).unwrap().expect("应该找到完成的文件");
        assert_eq!(found.file_name().unwrap(), "a.pdf");
    }

    #[tokio::test]
    async fn test_wait_for_download_times_out_within_bound() {
        let dir = tempfile::tempdir().expect("创建临时目录失败");
        let timeout = Duration::from_millis(200);
        let interval = Duration::from_millis(50);

        let start = Instant::now();
        let result = wait_for_download(dir.path(), timeout, interval).await;
        let elapsed = start.elapsed();

        assert!(matches!(result, Err(DownloadError::Timeout { .. })));
        // 超时必须在 timeout + interval 的窗口内触发，不能无限等待
        assert!(elapsed < timeout + interval + Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_wait_for_download_picks_up_late_file() {
        let dir = tempfile::tempdir().expect("创建临时目录失败");
        let path = dir.path().to_path_buf();

        tokio::spawn(async move {
            sleep(Duration::from_millis(120)).await;
            fs::write(path.join("late.pdf"), b"%PDF-1.4").unwrap();
        });

        let found = wait_for_download(
            dir.path(),
            Duration::from_secs(2),
            Duration::from_millis(50),
        )
        .await
        .expect("应该等到文件");
        assert_eq!(found.file_name().unwrap(), "late.pdf");
    }
}
