//! CLI 模块
//!
//! 提供命令行接口，支持以下功能：
//!
//! - `parse` - 解析规则并输出线上格式的表达式树
//! - `combine` - 用 OR 组合多条规则
//! - `evaluate` - 对已编码的表达式树求值
//! - `check` - 解析规则文本并直接求值
//!
//! # 使用示例
//!
//! ```bash
//! rule-engine parse "age > 30 AND department = 'Sales'"
//!
//! rule-engine combine "age > 30" "vip"
//!
//! rule-engine evaluate --ast @rule.json --data '{"age": 35}' --trace
//!
//! rule-engine check "age > 30" --data @user.json
//! ```
//!
//! 参数以 `@` 开头时从对应文件读取内容。

pub mod commands;
pub mod runner;

pub use commands::{Cli, Commands};
pub use runner::CommandRunner;
