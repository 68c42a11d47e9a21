//! 规则表达式引擎
//!
//! 提供可复用的规则评估能力，支持：
//! - 规则文本的词法分析和递归下降解析
//! - 表达式树与 `Type`/`Value`/`Left`/`Right` 线上格式互转
//! - 失败即为 false 的短路求值
//! - 多条规则的 OR 组合
//! - 规则编译、存储和带追踪的执行

pub mod cli;
pub mod codec;
pub mod compiler;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod models;
pub mod operators;
pub mod parser;
pub mod store;
pub mod tokenizer;

pub use codec::{decode, encode};
pub use compiler::{CompiledRule, RuleCompiler, combine, extract_fields};
pub use error::{Result, RuleError};
pub use evaluator::{RuleEvaluator, evaluate};
pub use executor::RuleExecutor;
pub use models::{
    BranchKind, Context, EvaluationResult, LeafKind, MAX_TREE_DEPTH, Node, NodeKind, Number,
    Value,
};
pub use operators::Operator;
pub use parser::{Parser, parse};
pub use store::{RuleStore, RuleStoreStats, StoredRule};
pub use tokenizer::{Token, TokenKind, Tokenizer, tokenize};
