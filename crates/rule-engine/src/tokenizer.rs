//! 规则词法分析器
//!
//! 按优先级依次尝试正则模式，将规则文本惰性地切分为 Token。
//! 多个模式共享前缀（如 `>` 与 `>=`、`AND` 与标识符），模式顺序不可调整。

use crate::error::{Result, RuleError};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Token 类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    LeftParen,
    RightParen,
    /// 其余固定标点：`; { } [ ] , . ? :`
    Punctuation,
    /// `>` `<` `>=` `<=`
    Relational,
    /// `=` `!=`
    Equality,
    LogicalAnd,
    LogicalOr,
    Number,
    String,
    /// 字段名，以及语法层面识别的 true/false/null
    Identifier,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::LeftParen => "'('",
            Self::RightParen => "')'",
            Self::Punctuation => "标点",
            Self::Relational => "关系运算符",
            Self::Equality => "相等运算符",
            Self::LogicalAnd => "AND",
            Self::LogicalOr => "OR",
            Self::Number => "数字",
            Self::String => "字符串",
            Self::Identifier => "标识符",
        };
        write!(f, "{}", s)
    }
}

/// 词法单元
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// 原始文本，字符串保留引号
    pub text: &'a str,
    /// 在规则文本中的字节偏移
    pub position: usize,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' (位置 {})", self.text, self.position)
    }
}

/// 模式表，`None` 表示匹配后丢弃
static TOKEN_SPEC: LazyLock<Vec<(Regex, Option<TokenKind>)>> = LazyLock::new(|| {
    let spec: &[(&str, Option<TokenKind>)] = &[
        // 空白与注释
        (r"^[\t\n\x0C\r ]+", None),
        (r"^//[^\n]*", None),
        (r"^/\*[\s\S]*?\*/", None),
        // 标点
        (r"^\(", Some(TokenKind::LeftParen)),
        (r"^\)", Some(TokenKind::RightParen)),
        (r"^[;{}\[\],.?:]", Some(TokenKind::Punctuation)),
        // 比较运算符
        (r"^[<>]=?", Some(TokenKind::Relational)),
        (r"^!?=", Some(TokenKind::Equality)),
        // 逻辑运算符，关键字必须先于标识符匹配
        (r"^&&", Some(TokenKind::LogicalAnd)),
        (r"^\|\|", Some(TokenKind::LogicalOr)),
        (r"^AND\b", Some(TokenKind::LogicalAnd)),
        (r"^OR\b", Some(TokenKind::LogicalOr)),
        // 字面量
        (r"^[0-9]+", Some(TokenKind::Number)),
        (r#"^"[^"]*""#, Some(TokenKind::String)),
        (r"^'[^']*'", Some(TokenKind::String)),
        (r"^[A-Za-z0-9_]+", Some(TokenKind::Identifier)),
    ];

    spec.iter()
        .map(|(pattern, kind)| (Regex::new(pattern).expect("内置词法模式无效"), *kind))
        .collect()
});

/// 词法分析器
///
/// 实现 `Iterator`，每次产出一个 `Result<Token>`；遇到无法识别的字符后不再产出。
pub struct Tokenizer<'a> {
    input: &'a str,
    cursor: usize,
    failed: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            cursor: 0,
            failed: false,
        }
    }

    /// 当前扫描位置
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// 读取下一个 Token，输入耗尽时返回 `Ok(None)`
    pub fn next_token(&mut self) -> Result<Option<Token<'a>>> {
        if self.failed {
            return Ok(None);
        }

        let input = self.input;

        'scan: while self.cursor < input.len() {
            let remaining = &input[self.cursor..];

            for (regex, kind) in TOKEN_SPEC.iter() {
                let Some(m) = regex.find(remaining) else {
                    continue;
                };

                let position = self.cursor;
                self.cursor += m.end();

                match kind {
                    Some(kind) => {
                        return Ok(Some(Token {
                            kind: *kind,
                            text: m.as_str(),
                            position,
                        }));
                    }
                    None => continue 'scan,
                }
            }

            self.failed = true;
            return Err(RuleError::Lex {
                position: self.cursor,
                found: remaining.chars().next().unwrap_or_default(),
            });
        }

        Ok(None)
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Result<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}

/// 一次性切分全部 Token
pub fn tokenize(input: &str) -> Result<Vec<Token<'_>>> {
    Tokenizer::new(input).collect()
}
