//! 规则执行器
//!
//! 在求值的同时记录匹配的比较条件和评估追踪信息。短路语义与 [`evaluate`] 完全一致，
//! 结果也总是相同。
//!
//! [`evaluate`]: crate::evaluator::evaluate

use crate::compiler::CompiledRule;
use crate::evaluator::RuleEvaluator;
use crate::models::{BranchKind, Context, EvaluationResult, Node};
use std::time::Instant;

/// 规则执行器
pub struct RuleExecutor {
    /// 是否记录详细评估追踪
    trace_enabled: bool,
}

impl RuleExecutor {
    pub fn new() -> Self {
        Self {
            trace_enabled: false,
        }
    }

    /// 启用评估追踪
    pub fn with_trace(mut self) -> Self {
        self.trace_enabled = true;
        self
    }

    /// 执行规则评估
    pub fn execute(&self, rule: &CompiledRule, context: &Context) -> EvaluationResult {
        let start = Instant::now();

        let mut result = EvaluationResult::new(rule.id().to_string());
        let matched = self.evaluate_node(rule.root(), context, &mut result, "root");
        result.matched = matched;
        result.evaluation_time_ms = start.elapsed().as_millis() as i64;

        result
    }

    /// 递归评估节点
    fn evaluate_node(
        &self,
        node: &Node,
        context: &Context,
        result: &mut EvaluationResult,
        path: &str,
    ) -> bool {
        match node {
            Node::Branch {
                kind: BranchKind::Binary,
                value,
                left,
                right,
            } => self.evaluate_comparison(node, value, left, right, context, result, path),
            Node::Branch {
                kind,
                value,
                left,
                right,
            } => self.evaluate_logical(*kind, value, left, right, context, result, path),
            Node::Leaf { value, .. } => {
                let present = RuleEvaluator::is_present(value, context);
                self.trace(result, || {
                    format!(
                        "{}: 字段 {} {}",
                        path,
                        value,
                        if present { "存在" } else { "不存在" }
                    )
                });
                present
            }
        }
    }

    /// 评估比较节点
    #[allow(clippy::too_many_arguments)]
    fn evaluate_comparison(
        &self,
        node: &Node,
        operator: &str,
        left: &Node,
        right: &Node,
        context: &Context,
        result: &mut EvaluationResult,
        path: &str,
    ) -> bool {
        let matched = RuleEvaluator::compare(operator, left, right, context);

        self.trace(result, || {
            format!(
                "{}: {} => {}",
                path,
                node,
                if matched { "MATCHED" } else { "NOT_MATCHED" }
            )
        });

        if matched {
            result.matched_conditions.push(format!("{}: {}", path, node));
        }

        matched
    }

    /// 评估逻辑节点（短路求值）
    #[allow(clippy::too_many_arguments)]
    fn evaluate_logical(
        &self,
        kind: BranchKind,
        operator: &str,
        left: &Node,
        right: &Node,
        context: &Context,
        result: &mut EvaluationResult,
        path: &str,
    ) -> bool {
        let left_path = format!("{}.left", path);
        let left_matched = self.evaluate_node(left, context, result, &left_path);

        // AND 遇到 false、OR 遇到 true 立即返回
        let short_circuit = match kind {
            BranchKind::LogicalAnd => !left_matched,
            _ => left_matched,
        };

        if short_circuit {
            self.trace(result, || format!("{}: {} 短路 - 左子节点已决定结果", path, operator));
            return left_matched;
        }

        let right_path = format!("{}.right", path);
        let matched = self.evaluate_node(right, context, result, &right_path);

        self.trace(result, || {
            format!(
                "{}: {} 组{}",
                path,
                operator,
                if matched { "匹配" } else { "不匹配" }
            )
        });

        matched
    }

    fn trace<F>(&self, result: &mut EvaluationResult, line: F)
    where
        F: FnOnce() -> String,
    {
        if self.trace_enabled {
            result.evaluation_trace.push(line());
        }
    }
}

impl Default for RuleExecutor {
    fn default() -> Self {
        Self::new()
    }
}
