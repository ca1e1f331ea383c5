//! 页面驱动 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"导航与执行 JS"两项能力
//!
//! 两项能力各有一个限时变体，超时直接表达在返回值里（导航 false、
//! 求值 None），由调用方决定这一步算失败还是暂时性问题。

use std::time::Duration;

use anyhow::{Context, Result};
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tokio::time::timeout;

/// 页面驱动
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 goto() / eval() 能力
/// - 不认识候选、任务与页面选择器
/// - 不处理业务流程
pub struct PageDriver {
    page: Page,
}

impl PageDriver {
    /// 创建新的页面驱动
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 导航到指定地址
    pub async fn goto(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .with_context(|| format!("导航到 {} 失败", url))?;
        Ok(())
    }

    /// 限时导航
    ///
    /// # 返回
    /// 超时返回 `Ok(false)`；导航本身出错返回 `Err`
    pub async fn goto_within(&self, url: &str, limit: Duration) -> Result<bool> {
        match timeout(limit, self.goto(url)).await {
            Ok(result) => result.map(|_| true),
            Err(_) => Ok(false),
        }
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        Ok(result.into_value()?)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let json_value = self.eval(js_code).await?;
        Ok(serde_json::from_value(json_value)?)
    }

    /// 限时执行 JS 代码
    ///
    /// # 返回
    /// 超时返回 `Ok(None)`；脚本执行出错返回 `Err`
    pub async fn eval_within<T: DeserializeOwned>(
        &self,
        js_code: impl Into<String>,
        limit: Duration,
    ) -> Result<Option<T>> {
        match timeout(limit, self.eval_as(js_code)).await {
            Ok(result) => result.map(Some),
            Err(_) => Ok(None),
        }
    }
}
