//! 浏览器答题客户端 - 业务能力层
//!
//! QuizClient 的 chromiumoxide 实现。页面选择器与成功反馈的启发式
//! 全部集中在这里，核心流程只消费布尔结果。

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::infrastructure::PageDriver;

use super::quiz_client::{QuizClient, SubmitOutcome};

// ========== 页面启发式（均按优先级排列） ==========

/// 答案输入框选择器
const INPUT_SELECTORS: &[&str] = &[
    "input[type='text']",
    "input[type='number']",
    "textarea",
    ".text-area",
    ".string-quiz__input",
    "[contenteditable='true']",
];

/// 提交按钮选择器
const SUBMIT_SELECTORS: &[&str] = &[
    "button.submit-submission",
    "button[type='submit']",
    "[type='submit']",
];

/// 成功反馈标记元素
const SUCCESS_SELECTORS: &[&str] = &[".correct", ".success", ".attempt-message_correct"];

/// 成功反馈文本模式（大小写不敏感）
const SUCCESS_TEXT_PATTERNS: &[&str] = &["правильно", "верно", "correct"];

/// 登录表单选择器
const LOGIN_EMAIL_SELECTORS: &[&str] = &[
    "input[name='login']",
    "input[type='email']",
    "#id_login_email",
];
const LOGIN_PASSWORD_SELECTORS: &[&str] = &["input[name='password']", "input[type='password']"];

/// 登录成功的判据：页面出现个人主页链接
const LOGGED_IN_PROBE: &str = "a[href^='/users/']";

/// 登录错误提示容器
const LOGIN_ERROR_PROBE: &str = ".alert-danger, .error, .has-error";

/// 浏览器答题客户端
pub struct BrowserClient {
    driver: PageDriver,
    login_url: String,
    page_wait: Duration,
    login_wait: Duration,
    submit_wait: Duration,
    call_timeout: Duration,
    success_patterns: Vec<Regex>,
}

#[derive(Debug, Deserialize)]
struct SubmitProbe {
    filled: bool,
    clicked: bool,
}

impl BrowserClient {
    /// 创建新的浏览器客户端
    pub fn new(driver: PageDriver, config: &Config) -> Result<Self> {
        Ok(Self {
            driver,
            login_url: config.login_url.clone(),
            page_wait: Duration::from_millis(config.page_wait_ms),
            login_wait: Duration::from_millis(config.login_wait_ms),
            submit_wait: Duration::from_millis(config.submit_wait_ms),
            call_timeout: Duration::from_secs(config.client_timeout_secs),
            success_patterns: compile_success_patterns()?,
        })
    }

    /// 探测平台可达性（诊断用）：打开登录页并读取标题
    pub async fn test_connection(&self) -> Result<bool> {
        info!("🔎 测试平台连接: {}", self.login_url);
        match self
            .driver
            .goto_within(&self.login_url, self.call_timeout)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                warn!("⚠️ 打开登录页超时");
                return Ok(false);
            }
            Err(e) => {
                warn!("⚠️ 打开登录页失败: {}", e);
                return Ok(false);
            }
        }
        sleep(self.page_wait).await;

        let title: String = self.driver.eval_as("document.title".to_string()).await?;
        info!("🔎 页面标题: {}", title);
        Ok(!title.is_empty())
    }

    /// 读取登录表单的错误提示文本
    async fn login_error_message(&self) -> Result<Option<String>> {
        let js = format!(
            r#"(function() {{
    var el = document.querySelector({});
    return el ? el.textContent.trim() : null;
}})()"#,
            serde_json::to_string(LOGIN_ERROR_PROBE)?
        );
        let message: Option<String> = self.driver.eval_as(js).await?;
        Ok(message.filter(|m| !m.is_empty()))
    }
}

#[async_trait]
impl QuizClient for BrowserClient {
    async fn login(&self, email: &str, password: &str) -> Result<bool> {
        info!("🔐 打开登录页: {}", self.login_url);
        match self
            .driver
            .goto_within(&self.login_url, self.call_timeout)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                warn!("⚠️ 打开登录页超时");
                return Ok(false);
            }
            Err(e) => {
                warn!("⚠️ 打开登录页失败: {}", e);
                return Ok(false);
            }
        }
        sleep(self.page_wait).await;

        let filled: bool = match self
            .driver
            .eval_within(fill_login_js(email, password)?, self.call_timeout)
            .await?
        {
            Some(filled) => filled,
            None => {
                warn!("⚠️ 登录脚本超时");
                return Ok(false);
            }
        };
        if !filled {
            warn!("❌ 找不到登录表单或提交按钮");
            return Ok(false);
        }

        // 等平台完成跳转
        sleep(self.login_wait).await;

        let logged_in: bool = match self
            .driver
            .eval_within(logged_in_probe_js()?, self.call_timeout)
            .await?
        {
            Some(logged_in) => logged_in,
            None => {
                warn!("⚠️ 登录状态检查超时");
                return Ok(false);
            }
        };
        if !logged_in {
            match self.login_error_message().await {
                Ok(Some(message)) => warn!("❌ 登录被拒绝: {}", message),
                _ => warn!("❌ 登录未生效"),
            }
        }
        Ok(logged_in)
    }

    async fn open(&self, url: &str) -> Result<bool> {
        info!("📖 打开目标页: {}", url);
        match self.driver.goto_within(url, self.call_timeout).await {
            Ok(true) => {}
            Ok(false) => {
                warn!("⚠️ 打开目标页超时");
                return Ok(false);
            }
            Err(e) => {
                warn!("⚠️ 打开目标页失败: {}", e);
                return Ok(false);
            }
        }
        sleep(self.page_wait).await;

        // 答题输入框必须存在，找不到视为致命
        let found: bool = match self
            .driver
            .eval_within(input_probe_js()?, self.call_timeout)
            .await?
        {
            Some(found) => found,
            None => {
                warn!("⚠️ 输入框检查超时");
                return Ok(false);
            }
        };
        if !found {
            warn!("❌ 页面上找不到答案输入框");
        }
        Ok(found)
    }

    async fn submit(&self, candidate: &str) -> Result<SubmitOutcome> {
        let probe: SubmitProbe = match self
            .driver
            .eval_within(fill_and_submit_js(candidate)?, self.call_timeout)
            .await
        {
            Ok(Some(probe)) => probe,
            Ok(None) => {
                debug!("提交脚本超时");
                return Ok(SubmitOutcome::transient());
            }
            Err(e) => {
                // 脚本执行失败多半是页面正在重绘或跳转，按暂时性处理
                debug!("提交脚本失败: {}", e);
                return Ok(SubmitOutcome::transient());
            }
        };

        if !probe.filled || !probe.clicked {
            debug!(
                "提交未完成: filled={} clicked={}",
                probe.filled, probe.clicked
            );
            return Ok(SubmitOutcome::transient());
        }

        // 留给平台消化这次提交
        sleep(self.submit_wait).await;
        Ok(SubmitOutcome::submitted())
    }

    async fn check_success(&self) -> Result<bool> {
        // 依优先级：先查成功标记元素，再扫正文文本，首个命中即确认
        let selector_hit: bool = match self
            .driver
            .eval_within(success_probe_js()?, self.call_timeout)
            .await?
        {
            Some(hit) => hit,
            None => {
                debug!("成功标记检查超时");
                false
            }
        };
        if selector_hit {
            return Ok(true);
        }

        let body: String = match self
            .driver
            .eval_within(body_text_js().to_string(), self.call_timeout)
            .await?
        {
            Some(body) => body,
            None => {
                debug!("读取页面文本超时");
                return Ok(false);
            }
        };
        Ok(self.success_patterns.iter().any(|p| p.is_match(&body)))
    }
}

// ========== JS 片段构造 ==========
// 所有动态内容都经 serde_json 转义后再拼进脚本

fn compile_success_patterns() -> Result<Vec<Regex>> {
    SUCCESS_TEXT_PATTERNS
        .iter()
        .map(|pattern| {
            // 词首边界防止 incorrect / неправильно 之类的反义词误判
            Regex::new(&format!(r"(?i)\b{}", pattern))
                .with_context(|| format!("编译成功反馈模式失败: {}", pattern))
        })
        .collect()
}

fn fill_login_js(email: &str, password: &str) -> Result<String> {
    Ok(format!(
        r#"(function() {{
    var email = {email};
    var password = {password};
    var emailSelectors = {email_selectors};
    var passwordSelectors = {password_selectors};
    var emailField = null;
    for (var i = 0; i < emailSelectors.length; i++) {{
        emailField = document.querySelector(emailSelectors[i]);
        if (emailField) break;
    }}
    var passwordField = null;
    for (var i = 0; i < passwordSelectors.length; i++) {{
        passwordField = document.querySelector(passwordSelectors[i]);
        if (passwordField) break;
    }}
    if (!emailField || !passwordField) return false;
    // 走原生 setter，绕过受控组件对 value 的劫持
    var setter = Object.getOwnPropertyDescriptor(window.HTMLInputElement.prototype, 'value').set;
    setter.call(emailField, email);
    emailField.dispatchEvent(new Event('input', {{ bubbles: true }}));
    setter.call(passwordField, password);
    passwordField.dispatchEvent(new Event('input', {{ bubbles: true }}));
    var button = document.querySelector("button[type='submit']");
    if (!button) return false;
    button.click();
    return true;
}})()"#,
        email = serde_json::to_string(email)?,
        password = serde_json::to_string(password)?,
        email_selectors = serde_json::to_string(LOGIN_EMAIL_SELECTORS)?,
        password_selectors = serde_json::to_string(LOGIN_PASSWORD_SELECTORS)?,
    ))
}

fn logged_in_probe_js() -> Result<String> {
    Ok(format!(
        "document.querySelector({}) !== null",
        serde_json::to_string(LOGGED_IN_PROBE)?
    ))
}

fn input_probe_js() -> Result<String> {
    Ok(format!(
        r#"(function() {{
    var selectors = {};
    for (var i = 0; i < selectors.length; i++) {{
        if (document.querySelector(selectors[i])) return true;
    }}
    return false;
}})()"#,
        serde_json::to_string(INPUT_SELECTORS)?
    ))
}

fn fill_and_submit_js(candidate: &str) -> Result<String> {
    Ok(format!(
        r#"(function() {{
    var value = {value};
    var selectors = {input_selectors};
    var field = null;
    for (var i = 0; i < selectors.length; i++) {{
        field = document.querySelector(selectors[i]);
        if (field) break;
    }}
    if (!field) return {{ filled: false, clicked: false }};
    if (field.isContentEditable) {{
        field.textContent = value;
    }} else {{
        var proto = field.tagName === 'TEXTAREA'
            ? window.HTMLTextAreaElement.prototype
            : window.HTMLInputElement.prototype;
        Object.getOwnPropertyDescriptor(proto, 'value').set.call(field, value);
    }}
    field.dispatchEvent(new Event('input', {{ bubbles: true }}));
    field.dispatchEvent(new Event('change', {{ bubbles: true }}));
    var submitSelectors = {submit_selectors};
    var button = null;
    for (var i = 0; i < submitSelectors.length; i++) {{
        button = document.querySelector(submitSelectors[i]);
        if (button) break;
    }}
    if (!button) {{
        var buttons = document.querySelectorAll('button');
        for (var i = 0; i < buttons.length; i++) {{
            if (/отправить|submit/i.test(buttons[i].textContent)) {{
                button = buttons[i];
                break;
            }}
        }}
    }}
    if (!button || button.disabled) return {{ filled: true, clicked: false }};
    button.click();
    return {{ filled: true, clicked: true }};
}})()"#,
        value = serde_json::to_string(candidate)?,
        input_selectors = serde_json::to_string(INPUT_SELECTORS)?,
        submit_selectors = serde_json::to_string(SUBMIT_SELECTORS)?,
    ))
}

fn success_probe_js() -> Result<String> {
    Ok(format!(
        r#"(function() {{
    var selectors = {};
    for (var i = 0; i < selectors.length; i++) {{
        var el = document.querySelector(selectors[i]);
        if (el && el.offsetParent !== null) return true;
    }}
    return false;
}})()"#,
        serde_json::to_string(SUCCESS_SELECTORS)?
    ))
}

fn body_text_js() -> &'static str {
    "document.body ? document.body.innerText : ''"
}
