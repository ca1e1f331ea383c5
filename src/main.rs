use anyhow::Result;
use quiz_answer_brute::config::Config;
use quiz_answer_brute::orchestrator::App;
use quiz_answer_brute::utils::logging;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    App::initialize(config).await?.run().await?;

    Ok(())
}
