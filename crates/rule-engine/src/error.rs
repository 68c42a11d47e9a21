//! 规则引擎错误类型

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("词法错误: 位置 {position} 处无法识别的字符 '{found}'")]
    Lex { position: usize, found: char },

    #[error("语法错误: 期望 {expected}, 实际 {found}")]
    Syntax { expected: String, found: String },

    #[error("格式错误: 字段 '{field}' {reason}")]
    Format { field: String, reason: String },

    #[error("规则组合失败: {0}")]
    Combine(String),

    #[error("规则未找到: {0}")]
    RuleNotFound(String),

    #[error("JSON 序列化错误: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl RuleError {
    pub(crate) fn syntax(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::Syntax {
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub(crate) fn format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Format {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::Lex { .. } => "LEX_ERROR",
            Self::Syntax { .. } => "SYNTAX_ERROR",
            Self::Format { .. } => "FORMAT_ERROR",
            Self::Combine(_) => "COMBINE_ERROR",
            Self::RuleNotFound(_) => "RULE_NOT_FOUND",
            Self::JsonError(_) => "JSON_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, RuleError>;
