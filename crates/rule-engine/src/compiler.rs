//! 规则编译器
//!
//! 将规则文本（或线上格式的表达式树）编译成内存中的执行树，并预提取规则引用的字段。

use crate::codec;
use crate::error::{Result, RuleError};
use crate::models::{LeafKind, Node};
use crate::parser::parse;
use serde_json::Value;
use std::collections::HashSet;

/// 多条规则之间的连接符
pub const COMBINE_SEPARATOR: &str = " OR ";

/// 用 OR 连接多条规则并解析为一棵树
///
/// 空列表直接报错，不存在隐式的恒真/恒假规则。
pub fn combine<S: AsRef<str>>(rule_texts: &[S]) -> Result<Node> {
    if rule_texts.is_empty() {
        return Err(RuleError::Combine("规则列表不能为空".to_string()));
    }

    parse(&join_rules(rule_texts))
}

fn join_rules<S: AsRef<str>>(rule_texts: &[S]) -> String {
    let texts: Vec<&str> = rule_texts.iter().map(|s| s.as_ref()).collect();
    texts.join(COMBINE_SEPARATOR)
}

/// 编译后的规则
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub id: String,
    /// 原始规则文本，从线上格式编译时为空
    pub source: Option<String>,
    pub root: Node,
    /// 规则中引用的所有字段名（用于优化字段提取）
    pub required_fields: HashSet<String>,
    /// 编译版本号（用于缓存失效）
    pub compile_version: u64,
}

impl CompiledRule {
    /// 获取规则 ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// 获取根节点
    pub fn root(&self) -> &Node {
        &self.root
    }
}

/// 规则编译器
pub struct RuleCompiler {
    compile_version: u64,
}

impl RuleCompiler {
    pub fn new() -> Self {
        Self { compile_version: 0 }
    }

    /// 从规则文本编译
    pub fn compile(&mut self, id: impl Into<String>, rule_text: &str) -> Result<CompiledRule> {
        let root = parse(rule_text)?;
        Ok(self.finish(id.into(), Some(rule_text.to_string()), root))
    }

    /// 组合多条规则后编译
    pub fn compile_combined<S: AsRef<str>>(
        &mut self,
        id: impl Into<String>,
        rule_texts: &[S],
    ) -> Result<CompiledRule> {
        let root = combine(rule_texts)?;
        Ok(self.finish(id.into(), Some(join_rules(rule_texts)), root))
    }

    /// 从线上格式编译
    pub fn compile_wire(&mut self, id: impl Into<String>, wire: &Value) -> Result<CompiledRule> {
        let root = codec::decode(wire)?;
        Ok(self.finish(id.into(), None, root))
    }

    fn finish(&mut self, id: String, source: Option<String>, root: Node) -> CompiledRule {
        let required_fields = extract_fields(&root);
        self.compile_version += 1;

        CompiledRule {
            id,
            source,
            root,
            required_fields,
            compile_version: self.compile_version,
        }
    }
}

impl Default for RuleCompiler {
    fn default() -> Self {
        Self::new()
    }
}

/// 提取规则中引用的所有字段
pub fn extract_fields(node: &Node) -> HashSet<String> {
    let mut fields = HashSet::new();
    collect_fields(node, &mut fields);
    fields
}

/// 递归收集字段
fn collect_fields(node: &Node, fields: &mut HashSet<String>) {
    match node {
        Node::Leaf {
            kind: LeafKind::Identifier,
            value,
        } => {
            fields.insert(value.clone());
        }
        Node::Leaf { .. } => {}
        Node::Branch { left, right, .. } => {
            collect_fields(left, fields);
            collect_fields(right, fields);
        }
    }
}
