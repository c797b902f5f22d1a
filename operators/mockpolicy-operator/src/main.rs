use anyhow::{Context, Result};
use clap::Parser;
use mockpolicy_operator::MockPolicyOperator;
use policyfw_controller::FrameworkConfig;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// MockPolicy Operator 命令行参数
#[derive(Parser, Debug)]
#[command(name = "mockpolicy-operator", version, about = "基于策略框架的 MockPolicy 控制器")]
struct Args {
    /// 配置文件路径（YAML 或 JSON）
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = FrameworkConfig::load(args.config.as_deref()).context("加载配置失败")?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(
        "启动 MockPolicy Operator，未知合规状态按违规处理: {}",
        config.unknown_compliancy_means_violation
    );

    MockPolicyOperator::new(&config).await?.run().await
}
