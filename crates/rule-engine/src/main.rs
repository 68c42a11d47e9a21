//! 规则引擎命令行入口
//!
//! 解析、组合、求值规则表达式，结果以 JSON 输出到 stdout。

use anyhow::{Context, Result};
use clap::Parser;
use rule_engine::cli::{Cli, CommandRunner};
use rule_shared::config::AppConfig;
use rule_shared::observability;
use tracing::error;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 统一加载配置：从 config/{service_name}.toml 加载，包含可观测性配置
    let config = AppConfig::load("rule-engine").unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {}", e);
        AppConfig {
            service_name: "rule-engine".to_string(),
            ..Default::default()
        }
    });

    let mut obs_config = config.observability.clone().with_service_name(&config.service_name);
    if let Some(level) = cli.log_level.clone() {
        obs_config.log_level = level;
    }
    let _guard = observability::init(&obs_config)?;

    let runner = CommandRunner::new(config.engine.clone());
    let output = runner.run(cli.command).inspect_err(|e| error!(error = %e, "命令执行失败"))?;

    let json = serde_json::to_string_pretty(&output).context("序列化输出失败")?;
    println!("{}", json);

    Ok(())
}
