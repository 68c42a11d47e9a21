//! 规则引擎领域模型
//!
//! 包含表达式树（AST）、评估上下文及评估结果。

use crate::error::{Result, RuleError};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// 表达式树最大深度（叶子为 1），解析和解码共用
pub const MAX_TREE_DEPTH: usize = 512;

/// 分支节点类型（总是有两个子节点）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchKind {
    LogicalOr,
    LogicalAnd,
    Binary,
}

/// 叶子节点类型（没有子节点）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeafKind {
    Identifier,
    NumericLiteral,
    StringLiteral,
    BooleanLiteral,
    NullLiteral,
}

/// 节点类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Branch(BranchKind),
    Leaf(LeafKind),
}

impl NodeKind {
    /// 所有已知的节点类型
    pub const ALL: [NodeKind; 8] = [
        NodeKind::Branch(BranchKind::LogicalOr),
        NodeKind::Branch(BranchKind::LogicalAnd),
        NodeKind::Branch(BranchKind::Binary),
        NodeKind::Leaf(LeafKind::Identifier),
        NodeKind::Leaf(LeafKind::NumericLiteral),
        NodeKind::Leaf(LeafKind::StringLiteral),
        NodeKind::Leaf(LeafKind::BooleanLiteral),
        NodeKind::Leaf(LeafKind::NullLiteral),
    ];

    /// 序列化格式中使用的类型名
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Branch(BranchKind::LogicalOr) => "LogicalOrExpression",
            Self::Branch(BranchKind::LogicalAnd) => "LogicalAndExpression",
            Self::Branch(BranchKind::Binary) => "BinaryExpression",
            Self::Leaf(LeafKind::Identifier) => "Identifier",
            Self::Leaf(LeafKind::NumericLiteral) => "NumericLiteral",
            Self::Leaf(LeafKind::StringLiteral) => "StringLiteral",
            Self::Leaf(LeafKind::BooleanLiteral) => "BooleanLiteral",
            Self::Leaf(LeafKind::NullLiteral) => "NullLiteral",
        }
    }

    pub fn from_wire_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.wire_name() == name)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

/// 表达式树节点
///
/// 分支节点一定有左右两个子节点，叶子节点一定没有子节点。
/// 树构建完成后不可变，可以在多个线程间共享。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    Branch {
        kind: BranchKind,
        /// 操作符文本（如 "AND"、">="）
        value: String,
        left: Box<Node>,
        right: Box<Node>,
    },
    Leaf {
        kind: LeafKind,
        /// 字面量文本，字符串字面量保留引号
        value: String,
    },
}

impl Node {
    pub fn branch(kind: BranchKind, value: impl Into<String>, left: Node, right: Node) -> Self {
        Self::Branch {
            kind,
            value: value.into(),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn leaf(kind: LeafKind, value: impl Into<String>) -> Self {
        Self::Leaf {
            kind,
            value: value.into(),
        }
    }

    pub fn or(left: Node, right: Node) -> Self {
        Self::branch(BranchKind::LogicalOr, "OR", left, right)
    }

    pub fn and(left: Node, right: Node) -> Self {
        Self::branch(BranchKind::LogicalAnd, "AND", left, right)
    }

    pub fn binary(operator: impl Into<String>, left: Node, right: Node) -> Self {
        Self::branch(BranchKind::Binary, operator, left, right)
    }

    pub fn identifier(name: impl Into<String>) -> Self {
        Self::leaf(LeafKind::Identifier, name)
    }

    pub fn number(text: impl Into<String>) -> Self {
        Self::leaf(LeafKind::NumericLiteral, text)
    }

    /// 字符串字面量，`text` 需包含引号
    pub fn string(text: impl Into<String>) -> Self {
        Self::leaf(LeafKind::StringLiteral, text)
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Branch { kind, .. } => NodeKind::Branch(*kind),
            Self::Leaf { kind, .. } => NodeKind::Leaf(*kind),
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Self::Branch { value, .. } | Self::Leaf { value, .. } => value,
        }
    }

    /// 获取左右子节点，叶子节点返回 None
    pub fn children(&self) -> Option<(&Node, &Node)> {
        match self {
            Self::Branch { left, right, .. } => Some((left, right)),
            Self::Leaf { .. } => None,
        }
    }

    /// 树的深度（叶子为 1）
    pub fn depth(&self) -> usize {
        match self {
            Self::Branch { left, right, .. } => 1 + left.depth().max(right.depth()),
            Self::Leaf { .. } => 1,
        }
    }
}

/// 渲染为全括号的规则文本，重新解析可得到相同的树
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Branch {
                value, left, right, ..
            } => write!(f, "({} {} {})", left, value, right),
            Self::Leaf { value, .. } => write!(f, "{}", value),
        }
    }
}

/// 数值，区分整数和浮点数
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Int(i) => *i as f64,
            Self::Float(f) => *f,
        }
    }
}

/// 上下文中的字段值
///
/// 派生的 `PartialEq` 是结构相等：`Int(30)` 与 `Float(30.0)` 不相等。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Number(Number),
    Text(String),
    Boolean(bool),
}

impl Value {
    /// 从 JSON 值转换，null、数组、对象无法表示，返回 None
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Self::Number(Number::Int(i))),
                None => n.as_f64().map(|f| Self::Number(Number::Float(f))),
            },
            serde_json::Value::String(s) => Some(Self::Text(s.clone())),
            serde_json::Value::Bool(b) => Some(Self::Boolean(*b)),
            serde_json::Value::Null
            | serde_json::Value::Array(_)
            | serde_json::Value::Object(_) => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Number(Number::Int(v))
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Number(Number::Int(v.into()))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Number(Number::Float(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

/// 评估上下文 - 提供给规则引擎的数据
///
/// 字段名区分大小写，不存在的字段即为缺失值。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Context {
    fields: HashMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// 链式添加字段
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// 从 JSON 对象创建，无法表示的值（null、数组、嵌套对象）视为缺失
    pub fn from_json(data: &serde_json::Value) -> Result<Self> {
        let map = data
            .as_object()
            .ok_or_else(|| RuleError::format("data", "上下文必须是 JSON 对象"))?;

        let fields = map
            .iter()
            .filter_map(|(name, value)| Value::from_json(value).map(|v| (name.clone(), v)))
            .collect();

        Ok(Self { fields })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let data: serde_json::Value = serde_json::from_str(json)?;
        Self::from_json(&data)
    }

    /// 获取字段值
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Context
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// 评估结果
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationResult {
    pub matched: bool,
    pub rule_id: String,
    pub matched_conditions: Vec<String>,
    pub evaluation_trace: Vec<String>,
    pub evaluation_time_ms: i64,
}

impl EvaluationResult {
    pub fn new(rule_id: String) -> Self {
        Self {
            matched: false,
            rule_id,
            matched_conditions: Vec::new(),
            evaluation_trace: Vec::new(),
            evaluation_time_ms: 0,
        }
    }
}
