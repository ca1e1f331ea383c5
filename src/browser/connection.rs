use anyhow::{Context, Result};
use chromiumoxide::{Browser, Handler, Page};
use futures::StreamExt;
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::AppError;

use super::headless::launch_headless_browser;

/// 远程浏览器端点
#[derive(Debug, Clone)]
pub struct RemoteEndpoint {
    /// "ws" 或 "http"
    pub protocol: String,
    pub host: String,
    pub port: u16,
}

impl RemoteEndpoint {
    pub fn address(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }
}

/// 按优先级获取浏览器与页面
///
/// 远程端点（若指定）→ 本地调试端口 → 无头浏览器（若允许）。
/// 前两级失败只降级，不中断启动。
pub async fn acquire_browser(
    config: &Config,
    remote: Option<&RemoteEndpoint>,
) -> Result<(Browser, Page)> {
    if let Some(endpoint) = remote {
        match connect_remote_browser(endpoint).await {
            Ok(pair) => return Ok(pair),
            Err(e) => warn!("⚠️ 远程浏览器不可用，回退本地: {}", e),
        }
    }

    match connect_to_debug_port(config.browser_debug_port).await {
        Ok(pair) => return Ok(pair),
        Err(e) => {
            if !config.launch_headless {
                return Err(e);
            }
            warn!("⚠️ 本地调试端口不可用，改为启动无头浏览器: {}", e);
        }
    }

    launch_headless_browser().await
}

/// 连接本地调试端口上的浏览器
pub async fn connect_to_debug_port(port: u16) -> Result<(Browser, Page)> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接本地调试端口: {}", browser_url);

    let (browser, handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("连接浏览器失败: {}", e);
        AppError::connection_failed(&browser_url, e)
    })?;
    debug!("浏览器连接成功");
    spawn_event_loop(handler);

    // 短暂延迟等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let page = first_or_new_page(&browser).await?;
    info!("✓ 本地浏览器就绪");
    Ok((browser, page))
}

/// 连接远程浏览器端点
///
/// ws 端点直接连；http 端点先查 /json/version 拿 WebSocket 调试地址。
pub async fn connect_remote_browser(endpoint: &RemoteEndpoint) -> Result<(Browser, Page)> {
    let address = endpoint.address();
    info!("正在连接远程浏览器: {}", address);

    let ws_url = if endpoint.protocol.starts_with("ws") {
        address
    } else {
        discover_ws_url(&address).await?
    };

    let (browser, handler) = Browser::connect(&ws_url).await.map_err(|e| {
        error!("连接远程浏览器失败: {}", e);
        AppError::connection_failed(&ws_url, e)
    })?;
    spawn_event_loop(handler);

    sleep(tokio::time::Duration::from_millis(300)).await;

    let page = first_or_new_page(&browser).await?;
    info!("✓ 远程浏览器就绪");
    Ok((browser, page))
}

#[derive(Debug, Deserialize)]
struct VersionInfo {
    #[serde(rename = "webSocketDebuggerUrl")]
    web_socket_debugger_url: String,
}

/// 通过 /json/version 发现 WebSocket 调试地址
async fn discover_ws_url(address: &str) -> Result<String> {
    let version_url = format!("{}/json/version", address);
    debug!("查询调试端点: {}", version_url);

    let info: VersionInfo = reqwest::get(&version_url)
        .await
        .with_context(|| format!("请求 {} 失败", version_url))?
        .json()
        .await
        .context("解析 /json/version 响应失败")?;
    Ok(info.web_socket_debugger_url)
}

/// 在后台消费浏览器事件流；事件流出错即退出
pub(crate) fn spawn_event_loop(mut handler: Handler) {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if event.is_err() {
                break;
            }
        }
    });
}

/// 复用第一个已打开的页面，没有则新建空白页
pub(crate) async fn first_or_new_page(browser: &Browser) -> Result<Page> {
    let pages = browser.pages().await?;
    debug!("获取到 {} 个页面", pages.len());

    match pages.into_iter().next() {
        Some(page) => Ok(page),
        None => {
            debug!("没有现成页面，创建空白页面");
            let page = browser.new_page("about:blank").await.map_err(|e| {
                error!("创建空白页面失败: {}", e);
                e
            })?;
            Ok(page)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_endpoint_address() {
        let ws = RemoteEndpoint {
            protocol: "ws".to_string(),
            host: "localhost".to_string(),
            port: 3000,
        };
        assert_eq!(ws.address(), "ws://localhost:3000");

        let http = RemoteEndpoint {
            protocol: "http".to_string(),
            host: "192.168.1.10".to_string(),
            port: 9222,
        };
        assert_eq!(http.address(), "http://192.168.1.10:9222");
    }
}
