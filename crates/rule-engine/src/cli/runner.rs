//! 命令执行器
//!
//! 负责执行各 CLI 子命令的具体逻辑，结果以 JSON 值返回，由入口打印。

use std::fs;

use anyhow::{Context as _, Result, bail};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};

use rule_shared::config::EngineConfig;

use crate::cli::Commands;
use crate::codec;
use crate::compiler::{COMBINE_SEPARATOR, CompiledRule, RuleCompiler, combine, extract_fields};
use crate::executor::RuleExecutor;
use crate::models::{Context, EvaluationResult};
use crate::parser::parse;

/// 命令行调用时使用的规则 ID
const CLI_RULE_ID: &str = "cli";

/// 求值命令的输出
#[derive(Debug, Serialize)]
pub struct EvaluationOutput {
    pub result: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_conditions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation_trace: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation_time_ms: Option<i64>,
}

impl EvaluationOutput {
    fn new(result: EvaluationResult, trace: bool) -> Self {
        if trace {
            Self {
                result: result.matched,
                matched_conditions: Some(result.matched_conditions),
                evaluation_trace: Some(result.evaluation_trace),
                evaluation_time_ms: Some(result.evaluation_time_ms),
            }
        } else {
            Self {
                result: result.matched,
                matched_conditions: None,
                evaluation_trace: None,
                evaluation_time_ms: None,
            }
        }
    }
}

/// 命令执行器
pub struct CommandRunner {
    config: EngineConfig,
    /// 求值类命令共用，编译版本号随每次编译递增
    compiler: Mutex<RuleCompiler>,
}

impl CommandRunner {
    /// 创建命令执行器
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            compiler: Mutex::new(RuleCompiler::new()),
        }
    }

    /// 执行子命令
    pub fn run(&self, command: Commands) -> Result<serde_json::Value> {
        match command {
            Commands::Parse { rule } => self.run_parse(&rule),
            Commands::Combine { rules } => self.run_combine(&rules),
            Commands::Evaluate { ast, data, trace } => self.run_evaluate(&ast, &data, trace),
            Commands::Check { rule, data, trace } => self.run_check(&rule, &data, trace),
        }
    }

    /// 解析规则，返回线上格式
    pub fn run_parse(&self, rule: &str) -> Result<serde_json::Value> {
        let rule_text = self.read_rule(rule)?;
        let root = parse(&rule_text)?;

        info!(fields = extract_fields(&root).len(), "规则解析完成");
        Ok(codec::encode(&root))
    }

    /// 组合多条规则，返回线上格式
    pub fn run_combine(&self, rules: &[String]) -> Result<serde_json::Value> {
        let rule_texts = rules
            .iter()
            .map(|rule| self.read_rule(rule))
            .collect::<Result<Vec<_>>>()?;
        self.ensure_length(&rule_texts.join(COMBINE_SEPARATOR))?;

        let root = combine(&rule_texts)?;

        info!(count = rule_texts.len(), depth = root.depth(), "规则组合完成");
        Ok(codec::encode(&root))
    }

    /// 对线上格式的表达式树求值
    pub fn run_evaluate(&self, ast: &str, data: &str, trace: bool) -> Result<serde_json::Value> {
        let wire = codec::parse_wire(&read_arg(ast)?).context("表达式树不是合法的 JSON")?;
        let compiled = self.compiler.lock().compile_wire(CLI_RULE_ID, &wire)?;

        self.execute(&compiled, data, trace)
    }

    /// 解析规则文本并求值
    pub fn run_check(&self, rule: &str, data: &str, trace: bool) -> Result<serde_json::Value> {
        let rule_text = self.read_rule(rule)?;
        let compiled = self.compiler.lock().compile(CLI_RULE_ID, &rule_text)?;

        self.execute(&compiled, data, trace)
    }

    fn execute(&self, rule: &CompiledRule, data: &str, trace: bool) -> Result<serde_json::Value> {
        let context = Context::from_json_str(&read_arg(data)?).context("上下文数据无效")?;

        let trace = trace || self.config.trace_enabled;
        let executor = if trace {
            RuleExecutor::new().with_trace()
        } else {
            RuleExecutor::new()
        };

        let result = executor.execute(rule, &context);
        debug!(
            compile_version = rule.compile_version,
            matched = result.matched,
            elapsed_ms = result.evaluation_time_ms,
            "规则评估完成"
        );

        Ok(serde_json::to_value(EvaluationOutput::new(result, trace))?)
    }

    /// 读取规则文本并检查长度
    fn read_rule(&self, arg: &str) -> Result<String> {
        let rule_text = read_arg(arg)?;
        self.ensure_length(&rule_text)?;
        Ok(rule_text)
    }

    fn ensure_length(&self, rule_text: &str) -> Result<()> {
        if rule_text.len() > self.config.max_rule_length {
            bail!(
                "规则文本过长: {} 字节，上限 {} 字节",
                rule_text.len(),
                self.config.max_rule_length
            );
        }
        Ok(())
    }
}

/// 读取参数值，`@path` 表示从文件读取
fn read_arg(arg: &str) -> Result<String> {
    match arg.strip_prefix('@') {
        Some(path) => fs::read_to_string(path).with_context(|| format!("读取文件失败: {}", path)),
        None => Ok(arg.to_string()),
    }
}

// ============================================================================
// 单元测试
// ============================================================================
