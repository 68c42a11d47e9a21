//! 共享库
//!
//! 包含规则引擎各组件共用的配置、错误处理和可观测性基础设施代码。

pub mod config;
pub mod error;
pub mod observability;
