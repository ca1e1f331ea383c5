use crate::models::CandidateSpace;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 持久化目录（账号配置、密钥、历史、任务表）
    pub data_dir: String,
    /// 结果 CSV 文件
    pub results_file: String,
    /// 运行日志文件
    pub output_log_file: String,
    /// 浏览器调试端口
    pub browser_debug_port: u16,
    /// 本地调试端口连不上时是否启动无头浏览器
    pub launch_headless: bool,
    /// 平台登录页
    pub login_url: String,
    /// 一次性模式的目标页；为空则进入定时调度模式
    pub target_url: Option<String>,
    /// 账号覆盖（优先于已保存配置）
    pub email: Option<String>,
    pub password: Option<String>,
    /// 相邻两次提交之间的间隔（毫秒）
    pub attempt_delay_ms: u64,
    /// 提交后等待平台反馈的时间（毫秒）
    pub submit_wait_ms: u64,
    /// 页面打开后的加载等待（毫秒）
    pub page_wait_ms: u64,
    /// 登录表单提交后的等待（毫秒）
    pub login_wait_ms: u64,
    /// 单次浏览器调用超时（秒）
    pub client_timeout_secs: u64,
    /// 调度器轮询间隔（秒）
    pub poll_interval_secs: u64,
    /// 每消费多少个候选打一条进度日志
    pub progress_log_every: u64,
    /// 历史记录条数上限
    pub history_cap: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- 一次性模式的候选空间 ---
    pub question_type: String,
    pub number_start: String,
    pub number_end: String,
    pub number_step: String,
    pub number_precision: u32,
    pub alphabet: String,
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            results_file: "results.csv".to_string(),
            output_log_file: "output.txt".to_string(),
            browser_debug_port: 9222,
            launch_headless: true,
            login_url: "https://stepik.org/catalog?auth=login".to_string(),
            target_url: None,
            email: None,
            password: None,
            attempt_delay_ms: 1000,
            submit_wait_ms: 2000,
            page_wait_ms: 3000,
            login_wait_ms: 5000,
            client_timeout_secs: 30,
            poll_interval_secs: 30,
            progress_log_every: 100,
            history_cap: 50,
            verbose_logging: false,
            question_type: "number".to_string(),
            number_start: "0".to_string(),
            number_end: "100".to_string(),
            number_step: "1".to_string(),
            number_precision: 0,
            alphabet: "digits".to_string(),
            min_length: 1,
            max_length: 4,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            data_dir: std::env::var("DATA_DIR").unwrap_or(default.data_dir),
            results_file: std::env::var("RESULTS_FILE").unwrap_or(default.results_file),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            browser_debug_port: std::env::var("BROWSER_DEBUG_PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.browser_debug_port),
            launch_headless: std::env::var("LAUNCH_HEADLESS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.launch_headless),
            login_url: std::env::var("LOGIN_URL").unwrap_or(default.login_url),
            target_url: std::env::var("TARGET_URL").ok().filter(|v| !v.is_empty()),
            email: std::env::var("ACCOUNT_EMAIL").ok().filter(|v| !v.is_empty()),
            password: std::env::var("ACCOUNT_PASSWORD").ok().filter(|v| !v.is_empty()),
            attempt_delay_ms: std::env::var("ATTEMPT_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.attempt_delay_ms),
            submit_wait_ms: std::env::var("SUBMIT_WAIT_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.submit_wait_ms),
            page_wait_ms: std::env::var("PAGE_WAIT_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.page_wait_ms),
            login_wait_ms: std::env::var("LOGIN_WAIT_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.login_wait_ms),
            client_timeout_secs: std::env::var("CLIENT_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.client_timeout_secs),
            poll_interval_secs: std::env::var("POLL_INTERVAL_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.poll_interval_secs),
            progress_log_every: std::env::var("PROGRESS_LOG_EVERY").ok().and_then(|v| v.parse().ok()).unwrap_or(default.progress_log_every),
            history_cap: std::env::var("HISTORY_CAP").ok().and_then(|v| v.parse().ok()).unwrap_or(default.history_cap),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            question_type: std::env::var("QUESTION_TYPE").unwrap_or(default.question_type),
            number_start: std::env::var("NUMBER_START").unwrap_or(default.number_start),
            number_end: std::env::var("NUMBER_END").unwrap_or(default.number_end),
            number_step: std::env::var("NUMBER_STEP").unwrap_or(default.number_step),
            number_precision: std::env::var("NUMBER_PRECISION").ok().and_then(|v| v.parse().ok()).unwrap_or(default.number_precision),
            alphabet: std::env::var("ALPHABET").unwrap_or(default.alphabet),
            min_length: std::env::var("MIN_LENGTH").ok().and_then(|v| v.parse().ok()).unwrap_or(default.min_length),
            max_length: std::env::var("MAX_LENGTH").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_length),
        }
    }

    /// 一次性模式下由配置拼出候选空间
    ///
    /// `question_type` 为 "string" 时取文本空间，其余取数值空间。
    pub fn candidate_space(&self) -> CandidateSpace {
        if self.question_type == "string" {
            CandidateSpace::textual(self.alphabet.clone(), self.min_length, self.max_length)
        } else {
            CandidateSpace::numeric(
                self.number_start.clone(),
                self.number_end.clone(),
                self.number_step.clone(),
                self.number_precision,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_candidate_space_is_numeric() {
        let config = Config::default();
        assert_eq!(config.candidate_space().question_type(), "number");
    }

    #[test]
    fn test_string_question_type_builds_textual_space() {
        let config = Config {
            question_type: "string".to_string(),
            ..Config::default()
        };
        match config.candidate_space() {
            CandidateSpace::Textual {
                alphabet,
                min_length,
                max_length,
            } => {
                assert_eq!(alphabet, "digits");
                assert_eq!(min_length, 1);
                assert_eq!(max_length, 4);
            }
            other => panic!("期望文本空间，实际为 {:?}", other),
        }
    }
}
