//! 规则存储管理
//!
//! 使用 DashMap 提供线程安全的内存存储，保存 `(规则文本, 编码后的表达式树)` 并返回生成的 ID。

use crate::codec;
use crate::compiler::{CompiledRule, RuleCompiler, COMBINE_SEPARATOR, combine, extract_fields};
use crate::error::{Result, RuleError};
use crate::evaluator::evaluate;
use crate::models::Context;
use crate::parser::parse;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// 已存储的规则
#[derive(Debug, Clone, Serialize)]
pub struct StoredRule {
    pub id: String,
    pub rule_text: String,
    /// 线上格式的表达式树
    pub ast: Value,
    pub created_at: DateTime<Utc>,
}

/// 规则存储
#[derive(Clone)]
pub struct RuleStore {
    rules: Arc<DashMap<String, StoredRule>>,
    /// 规则编译器
    compiler: Arc<parking_lot::Mutex<RuleCompiler>>,
}

impl RuleStore {
    /// 创建新的规则存储
    pub fn new() -> Self {
        Self {
            rules: Arc::new(DashMap::new()),
            compiler: Arc::new(parking_lot::Mutex::new(RuleCompiler::new())),
        }
    }

    /// 获取当前存储的规则数量
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// 检查存储是否为空
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 保存规则文本与编码后的表达式树，返回新生成的 ID
    #[instrument(skip(self, rule_text, ast))]
    pub fn save(&self, rule_text: impl Into<String>, ast: Value) -> String {
        let id = Uuid::new_v4().to_string();
        let stored = StoredRule {
            id: id.clone(),
            rule_text: rule_text.into(),
            ast,
            created_at: Utc::now(),
        };
        self.rules.insert(id.clone(), stored);

        info!(rule_id = %id, "规则已保存");
        id
    }

    /// 解析规则文本并保存
    #[instrument(skip(self))]
    pub fn create(&self, rule_text: &str) -> Result<String> {
        let root = parse(rule_text).inspect_err(|e| warn!(error = %e, "规则解析失败"))?;
        Ok(self.save(rule_text, codec::encode(&root)))
    }

    /// 用 OR 组合多条规则后保存
    #[instrument(skip(self, rule_texts), fields(count = rule_texts.len()))]
    pub fn combine<S: AsRef<str>>(&self, rule_texts: &[S]) -> Result<String> {
        let root = combine(rule_texts).inspect_err(|e| warn!(error = %e, "规则组合失败"))?;
        let source: Vec<&str> = rule_texts.iter().map(|s| s.as_ref()).collect();
        Ok(self.save(source.join(COMBINE_SEPARATOR), codec::encode(&root)))
    }

    /// 获取规则
    pub fn get(&self, rule_id: &str) -> Option<StoredRule> {
        self.rules.get(rule_id).map(|r| r.clone())
    }

    /// 解码已存储的表达式树
    pub fn compiled(&self, rule_id: &str) -> Result<CompiledRule> {
        let stored = self
            .get(rule_id)
            .ok_or_else(|| RuleError::RuleNotFound(rule_id.to_string()))?;

        let mut compiled = {
            let mut compiler = self.compiler.lock();
            compiler.compile_wire(stored.id.clone(), &stored.ast)?
        };
        compiled.source = Some(stored.rule_text);
        Ok(compiled)
    }

    /// 对已存储的规则求值
    #[instrument(skip(self, context))]
    pub fn evaluate(&self, rule_id: &str, context: &Context) -> Result<bool> {
        let compiled = self.compiled(rule_id)?;
        let matched = evaluate(compiled.root(), context);

        debug!(matched, "规则评估完成");
        Ok(matched)
    }

    /// 检查规则是否存在
    pub fn contains(&self, rule_id: &str) -> bool {
        self.rules.contains_key(rule_id)
    }

    /// 删除规则
    #[instrument(skip(self))]
    pub fn delete(&self, rule_id: &str) -> Result<()> {
        if self.rules.remove(rule_id).is_some() {
            info!("规则已删除: {}", rule_id);
            Ok(())
        } else {
            warn!("删除不存在的规则: {}", rule_id);
            Err(RuleError::RuleNotFound(rule_id.to_string()))
        }
    }

    /// 获取所有规则 ID
    pub fn list_ids(&self) -> Vec<String> {
        self.rules.iter().map(|r| r.key().clone()).collect()
    }

    /// 清空所有规则
    #[instrument(skip(self))]
    pub fn clear(&self) {
        let count = self.rules.len();
        self.rules.clear();
        info!("已清空 {} 条规则", count);
    }

    /// 获取规则统计信息
    pub fn stats(&self) -> RuleStoreStats {
        let rules_count = self.rules.len();
        let roots: Vec<_> = self
            .rules
            .iter()
            .filter_map(|r| match codec::decode(&r.ast) {
                Ok(root) => Some(root),
                Err(e) => {
                    warn!(rule_id = %r.key(), error = %e, "规则表达式树无法解码");
                    None
                }
            })
            .collect();
        let total_fields: usize = roots.iter().map(|root| extract_fields(root).len()).sum();

        RuleStoreStats {
            rules_count,
            invalid_count: rules_count - roots.len(),
            total_fields,
            max_depth: roots.iter().map(|root| root.depth()).max().unwrap_or(0),
            avg_fields_per_rule: if roots.is_empty() {
                0.0
            } else {
                total_fields as f64 / roots.len() as f64
            },
        }
    }
}

impl Default for RuleStore {
    fn default() -> Self {
        Self::new()
    }
}

/// 规则存储统计信息
#[derive(Debug, Clone, Serialize)]
pub struct RuleStoreStats {
    /// 规则总数
    pub rules_count: usize,
    /// 表达式树无法解码的规则数，不计入字段和深度统计
    pub invalid_count: usize,
    /// 所有规则引用的字段总数
    pub total_fields: usize,
    /// 最深的表达式树深度
    pub max_depth: usize,
    /// 平均每条规则引用的字段数
    pub avg_fields_per_rule: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_rule() {
        let store = RuleStore::new();
        let id = store.create("age > 30 AND department = 'Sales'").unwrap();

        assert_eq!(store.len(), 1);
        assert!(store.contains(&id));

        let stored = store.get(&id).unwrap();
        assert_eq!(stored.rule_text, "age > 30 AND department = 'Sales'");
        assert_eq!(stored.ast["Type"], json!("LogicalAndExpression"));
    }

    #[test]
    fn test_create_invalid_rule() {
        let store = RuleStore::new();
        let result = store.create("age >");

        assert!(matches!(result, Err(RuleError::Syntax { .. })));
        assert!(store.is_empty());
    }

    #[test]
    fn test_save_returns_unique_ids() {
        let store = RuleStore::new();
        let ast = codec::encode(&parse("a").unwrap());

        let id1 = store.save("a", ast.clone());
        let id2 = store.save("a", ast);

        assert_ne!(id1, id2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_combine_rules() {
        let store = RuleStore::new();
        let id = store.combine(&["a = 1", "b = 2"]).unwrap();

        let stored = store.get(&id).unwrap();
        assert_eq!(stored.rule_text, "a = 1 OR b = 2");
        assert_eq!(stored.ast["Type"], json!("LogicalOrExpression"));

        let empty: Vec<String> = Vec::new();
        assert!(matches!(store.combine(&empty), Err(RuleError::Combine(_))));
    }

    #[test]
    fn test_compiled_round_trip() {
        let store = RuleStore::new();
        let text = "(age > 30 AND department = 'Sales') OR salary > 50000";
        let id = store.create(text).unwrap();

        let compiled = store.compiled(&id).unwrap();
        assert_eq!(compiled.root(), &parse(text).unwrap());
        assert_eq!(compiled.source.as_deref(), Some(text));
        assert_eq!(compiled.required_fields.len(), 3);
    }

    #[test]
    fn test_evaluate_stored_rule() {
        let store = RuleStore::new();
        let id = store.create("age > 30").unwrap();

        assert!(store.evaluate(&id, &Context::new().with("age", 32)).unwrap());
        assert!(!store.evaluate(&id, &Context::new().with("age", 30)).unwrap());
        assert!(matches!(
            store.evaluate("nonexistent", &Context::new()),
            Err(RuleError::RuleNotFound(_))
        ));
    }

    #[test]
    fn test_corrupted_ast_is_format_error() {
        let store = RuleStore::new();
        let id = store.save("broken", json!({"Type": "Nope", "Value": ""}));

        assert!(matches!(store.compiled(&id), Err(RuleError::Format { .. })));
    }

    #[test]
    fn test_get_nonexistent_rule() {
        let store = RuleStore::new();
        assert!(store.get("nonexistent").is_none());
    }

    #[test]
    fn test_delete_rule() {
        let store = RuleStore::new();
        let id = store.create("a = 1").unwrap();

        store.delete(&id).unwrap();

        assert!(!store.contains(&id));
        assert!(store.delete(&id).is_err());
    }

    #[test]
    fn test_list_ids_and_clear() {
        let store = RuleStore::new();
        let id1 = store.create("a").unwrap();
        let id2 = store.create("b").unwrap();

        let ids = store.list_ids();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&id1));
        assert!(ids.contains(&id2));

        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_stats() {
        let store = RuleStore::new();
        store.create("a = 1 AND b = 2").unwrap();
        store.create("c > 3 OR d < 4").unwrap();

        let stats = store.stats();

        assert_eq!(stats.rules_count, 2);
        assert_eq!(stats.total_fields, 4); // 每条规则引用 2 个字段
        assert_eq!(stats.avg_fields_per_rule, 2.0);
        assert_eq!(stats.max_depth, 3);
        assert_eq!(stats.invalid_count, 0);
    }

    #[test]
    fn test_stats_counts_undecodable_rules() {
        let store = RuleStore::new();
        store.create("a = 1 AND b = 2").unwrap();
        store.save("broken", json!({"Type": "Nope", "Value": ""}));

        let stats = store.stats();

        assert_eq!(stats.rules_count, 2);
        assert_eq!(stats.invalid_count, 1);
        assert_eq!(stats.total_fields, 2);
        assert_eq!(stats.avg_fields_per_rule, 2.0);
        assert_eq!(stats.max_depth, 3);
    }

    #[test]
    fn test_concurrent_access() {
        use std::thread;

        let store = RuleStore::new();
        let store_clone = store.clone();

        let handle = thread::spawn(move || {
            for i in 0..100 {
                store_clone.create(&format!("field_{} > {}", i, i)).unwrap();
            }
        });

        for i in 100..200 {
            store.create(&format!("field_{} > {}", i, i)).unwrap();
        }

        handle.join().unwrap();

        assert_eq!(store.len(), 200);
    }
}
