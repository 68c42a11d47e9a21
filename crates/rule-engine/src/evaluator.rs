//! 表达式树解释器
//!
//! 纯函数求值：不持有状态，不产生副作用。运行期的类型不匹配、字段缺失、
//! 未知操作符都不会报错，而是让对应的子表达式结果为 false。

use crate::models::{BranchKind, Context, LeafKind, Node, Number, Value};
use crate::operators::Operator;
use std::borrow::Cow;

/// 规则求值器
pub struct RuleEvaluator;

impl RuleEvaluator {
    /// 对上下文求值表达式树
    pub fn evaluate(node: &Node, context: &Context) -> bool {
        match node {
            Node::Branch {
                kind: BranchKind::LogicalAnd,
                left,
                right,
                ..
            } => Self::evaluate(left, context) && Self::evaluate(right, context),
            Node::Branch {
                kind: BranchKind::LogicalOr,
                left,
                right,
                ..
            } => Self::evaluate(left, context) || Self::evaluate(right, context),
            Node::Branch {
                kind: BranchKind::Binary,
                value,
                left,
                right,
            } => Self::compare(value, left, right, context),
            // 叶子节点直接作为布尔值时，表示"上下文中存在该字段"
            Node::Leaf { value, .. } => Self::is_present(value, context),
        }
    }

    /// 叶子作为布尔值：上下文是否包含与节点原始文本同名的键
    pub(crate) fn is_present(name: &str, context: &Context) -> bool {
        context.contains(name)
    }

    /// 比较节点求值，任一操作数缺失或操作符未知时为 false
    pub(crate) fn compare(operator: &str, left: &Node, right: &Node, context: &Context) -> bool {
        let Some(operator) = Operator::from_symbol(operator) else {
            return false;
        };

        let (Some(left), Some(right)) = (
            Self::value_of(left, context),
            Self::value_of(right, context),
        ) else {
            return false;
        };

        match operator {
            Operator::Eq => Self::eq(&left, &right),
            // 不做数值转换的结构比较
            Operator::Neq => left != right,
            Operator::Gt => Self::compare_numeric(&left, &right, |a, b| a > b),
            Operator::Gte => Self::compare_numeric(&left, &right, |a, b| a >= b),
            Operator::Lt => Self::compare_numeric(&left, &right, |a, b| a < b),
            Operator::Lte => Self::compare_numeric(&left, &right, |a, b| a <= b),
        }
    }

    /// 比较操作数取值
    fn value_of<'c>(node: &Node, context: &'c Context) -> Option<Cow<'c, Value>> {
        match node {
            Node::Leaf {
                kind: LeafKind::Identifier,
                value,
            } => context.get(value).map(Cow::Borrowed),
            Node::Leaf {
                kind: LeafKind::NumericLiteral,
                value,
            } => value
                .parse::<i64>()
                .ok()
                .map(|n| Cow::Owned(Value::Number(Number::Int(n)))),
            Node::Leaf {
                kind: LeafKind::StringLiteral,
                value,
            } => Some(Cow::Owned(Value::Text(strip_quotes(value).to_string()))),
            _ => None,
        }
    }

    /// 相等比较：数值之间按数值比较，文本之间精确比较，其他组合为 false
    fn eq(left: &Value, right: &Value) -> bool {
        match (left, right) {
            (Value::Number(a), Value::Number(b)) => match (a, b) {
                (Number::Int(a), Number::Int(b)) => a == b,
                _ => a.as_f64() == b.as_f64(),
            },
            (Value::Text(a), Value::Text(b)) => a == b,
            _ => false,
        }
    }

    /// 数值比较
    fn compare_numeric<F>(left: &Value, right: &Value, cmp: F) -> bool
    where
        F: Fn(f64, f64) -> bool,
    {
        match (Self::as_f64(left), Self::as_f64(right)) {
            (Some(a), Some(b)) => cmp(a, b),
            _ => false,
        }
    }

    /// 尝试将 Value 转换为 f64
    fn as_f64(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => Some(n.as_f64()),
            Value::Text(s) => s.parse().ok(),
            Value::Boolean(_) => None,
        }
    }
}

/// 去掉首尾各一个引号字符，不处理转义
fn strip_quotes(literal: &str) -> &str {
    let is_quote = |c: char| c == '\'' || c == '"';
    let literal = literal.strip_prefix(is_quote).unwrap_or(literal);
    literal.strip_suffix(is_quote).unwrap_or(literal)
}

/// 对上下文求值表达式树
pub fn evaluate(node: &Node, context: &Context) -> bool {
    RuleEvaluator::evaluate(node, context)
}
