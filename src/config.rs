/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// HTTP 服务监听端口
    pub port: u16,
    /// SAC 官网根地址
    pub sac_base_url: String,
    /// 预热导航的落地页路径
    pub landing_page: String,
    /// 每次 API 请求之后的固定延迟（秒），建议 2-3 秒
    pub request_delay_secs: u64,
    /// 预热导航后等待反爬虫检测的时间（秒）
    pub warm_up_secs: u64,
    /// 是否使用无头模式（不显示浏览器窗口）
    pub headless: bool,
    /// 模拟真实浏览器的 User-Agent
    pub user_agent: String,
    /// Chrome/Chromium 可执行文件路径（不设置则自动探测）
    pub chrome_path: Option<String>,
    /// PDF 下载超时时间（秒）
    pub download_timeout_secs: u64,
    /// PDF 下载目录轮询间隔（毫秒）
    pub download_poll_interval_ms: u64,
    /// 下载文件出现后的落盘等待时间（毫秒）
    pub download_settle_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            sac_base_url: "https://gs.sac.net.cn".to_string(),
            landing_page: "/pages/registration/sac-publicity-name.html".to_string(),
            request_delay_secs: 2,
            warm_up_secs: 3,
            headless: true,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/143.0.0.0 Safari/537.36".to_string(),
            chrome_path: None,
            download_timeout_secs: 120,
            download_poll_interval_ms: 500,
            download_settle_ms: 500,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            port: std::env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.port),
            sac_base_url: std::env::var("SAC_BASE_URL").unwrap_or(default.sac_base_url),
            landing_page: std::env::var("SAC_LANDING_PAGE").unwrap_or(default.landing_page),
            request_delay_secs: std::env::var("REQUEST_DELAY_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.request_delay_secs),
            warm_up_secs: std::env::var("WARM_UP_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.warm_up_secs),
            headless: std::env::var("HEADLESS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.headless),
            user_agent: std::env::var("USER_AGENT").unwrap_or(default.user_agent),
            chrome_path: std::env::var("CHROME_PATH").ok(),
            download_timeout_secs: std::env::var("DOWNLOAD_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.download_timeout_secs),
            download_poll_interval_ms: std::env::var("DOWNLOAD_POLL_INTERVAL_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.download_poll_interval_ms),
            download_settle_ms: std::env::var("DOWNLOAD_SETTLE_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.download_settle_ms),
        }
    }

    /// 预热导航的完整落地页地址
    pub fn landing_url(&self) -> String {
        format!("{}{}", self.sac_base_url, self.landing_page)
    }
}
