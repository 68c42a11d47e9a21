//! CLI 命令定义
//!
//! 使用 clap derive 宏定义命令行接口结构。

use clap::{Parser, Subcommand};

/// 规则引擎命令行工具
///
/// 使用 `--help` 查看各子命令的详细说明。
#[derive(Parser, Debug)]
#[command(name = "rule-engine")]
#[command(version, about = "规则表达式解析与求值工具")]
#[command(propagate_version = true)]
pub struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)，覆盖配置文件
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// 子命令枚举
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 解析规则文本，输出线上格式的表达式树
    Parse {
        /// 规则文本（@path 从文件读取）
        rule: String,
    },

    /// 用 OR 组合多条规则，输出组合后的表达式树
    Combine {
        /// 规则文本列表（每项均可用 @path）
        #[arg(required = true)]
        rules: Vec<String>,
    },

    /// 对线上格式的表达式树求值
    Evaluate {
        /// 表达式树 JSON（@path 从文件读取）
        #[arg(short, long)]
        ast: String,

        /// 上下文数据 JSON 对象（@path 从文件读取）
        #[arg(short, long)]
        data: String,

        /// 输出评估追踪
        #[arg(long)]
        trace: bool,
    },

    /// 解析规则文本并直接求值
    Check {
        /// 规则文本（@path 从文件读取）
        rule: String,

        /// 上下文数据 JSON 对象（@path 从文件读取）
        #[arg(short, long)]
        data: String,

        /// 输出评估追踪
        #[arg(long)]
        trace: bool,
    },
}

// ============================================================================
// 单元测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_parse() {
        let cli = Cli::parse_from(["rule-engine", "parse", "age > 30"]);
        match cli.command {
            Commands::Parse { rule } => assert_eq!(rule, "age > 30"),
            _ => panic!("预期 Parse 命令"),
        }
        assert!(cli.log_level.is_none());
    }

    #[test]
    fn test_cli_parse_combine() {
        let cli = Cli::parse_from(["rule-engine", "combine", "a = 1", "b = 2", "@rules.txt"]);
        match cli.command {
            Commands::Combine { rules } => {
                assert_eq!(rules, vec!["a = 1", "b = 2", "@rules.txt"]);
            }
            _ => panic!("预期 Combine 命令"),
        }

        // 至少需要一条规则
        assert!(Cli::try_parse_from(["rule-engine", "combine"]).is_err());
    }

    #[test]
    fn test_cli_parse_evaluate() {
        let cli = Cli::parse_from([
            "rule-engine",
            "evaluate",
            "--ast",
            "@rule.json",
            "-d",
            r#"{"age": 35}"#,
            "--trace",
            "--log-level",
            "debug",
        ]);
        match cli.command {
            Commands::Evaluate { ast, data, trace } => {
                assert_eq!(ast, "@rule.json");
                assert_eq!(data, r#"{"age": 35}"#);
                assert!(trace);
            }
            _ => panic!("预期 Evaluate 命令"),
        }
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_cli_parse_check() {
        let cli = Cli::parse_from(["rule-engine", "check", "vip", "--data", "{}"]);
        match cli.command {
            Commands::Check { rule, data, trace } => {
                assert_eq!(rule, "vip");
                assert_eq!(data, "{}");
                assert!(!trace);
            }
            _ => panic!("预期 Check 命令"),
        }

        // 缺少 --data
        assert!(Cli::try_parse_from(["rule-engine", "check", "vip"]).is_err());
    }
}
