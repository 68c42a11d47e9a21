//! 配置与可观测性集成测试
//!
//! 从配置文件加载 AppConfig，并用其中的可观测性配置初始化日志。

use rule_shared::config::AppConfig;
use rule_shared::observability::{self, ObservabilityConfig};
use std::fs;

#[test]
fn test_config_drives_observability_init() {
    let dir = std::env::temp_dir().join(format!("rule-shared-it-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("rule-engine.toml"),
        "[observability]\nlog_level = \"debug\"\nlog_format = \"json\"\n",
    )
    .unwrap();

    let config = AppConfig::load_from("rule-engine", "test", &dir).unwrap();
    let obs_config = config
        .observability
        .clone()
        .with_service_name(&config.service_name);

    assert_eq!(obs_config.service_name, "rule-engine");
    assert_eq!(obs_config.log_level, "debug");
    assert!(obs_config.json_logs());

    // 集成测试二进制中只有这一处设置全局订阅器
    let guard = observability::init(&obs_config).unwrap();
    tracing::info!(rule_count = 3, "日志已初始化");
    drop(guard);

    fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_partial_observability_section_keeps_defaults() {
    let config: ObservabilityConfig =
        serde_json::from_str(r#"{"log_level": "warn"}"#).unwrap();

    assert_eq!(config.log_level, "warn");
    assert_eq!(config.log_format, "pretty");
}
