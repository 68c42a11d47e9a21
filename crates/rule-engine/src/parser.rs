//! 规则语法分析器
//!
//! 递归下降解析，优先级由低到高：OR、AND、相等比较、关系比较、基本表达式。
//! 每一层都是左结合的：`a OP b OP c` 构建为 `(a OP b) OP c`。

use crate::error::{Result, RuleError};
use crate::models::{BranchKind, LeafKind, MAX_TREE_DEPTH, Node};
use crate::tokenizer::{Token, TokenKind, Tokenizer};

const END_OF_INPUT: &str = "输入结束";

/// 括号最大嵌套深度
pub const MAX_NESTING_DEPTH: usize = 128;

/// 语法分析器，生命周期仅限一次解析
pub struct Parser<'a> {
    tokenizer: Tokenizer<'a>,
    lookahead: Option<Token<'a>>,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            tokenizer: Tokenizer::new(input),
            lookahead: None,
            depth: 0,
        }
    }

    /// 解析整条规则，失败时不返回任何部分结果
    pub fn parse(mut self) -> Result<Node> {
        self.advance()?;

        if self.lookahead.is_none() {
            return Err(RuleError::syntax("规则表达式", END_OF_INPUT));
        }

        let (root, _) = self.logical_or("表达式")?;

        match self.lookahead {
            Some(token) => Err(RuleError::syntax("AND、OR 或比较运算符", token.to_string())),
            None => Ok(root),
        }
    }

    /// logicalOr := logicalAnd ( OR logicalAnd )*
    fn logical_or(&mut self, expected: &str) -> Result<Subtree> {
        let mut left = self.logical_and(expected)?;

        while let Some(operator) = self.eat_if(TokenKind::LogicalOr)? {
            let right = self.logical_and(&right_operand(&operator))?;
            left = fold(BranchKind::LogicalOr, operator, left, right)?;
        }

        Ok(left)
    }

    /// logicalAnd := equality ( AND equality )*
    fn logical_and(&mut self, expected: &str) -> Result<Subtree> {
        let mut left = self.equality(expected)?;

        while let Some(operator) = self.eat_if(TokenKind::LogicalAnd)? {
            let right = self.equality(&right_operand(&operator))?;
            left = fold(BranchKind::LogicalAnd, operator, left, right)?;
        }

        Ok(left)
    }

    /// equality := relational ( ('=' | '!=') relational )*
    fn equality(&mut self, expected: &str) -> Result<Subtree> {
        let mut left = self.relational(expected)?;

        while let Some(operator) = self.eat_if(TokenKind::Equality)? {
            let right = self.relational(&right_operand(&operator))?;
            left = fold(BranchKind::Binary, operator, left, right)?;
        }

        Ok(left)
    }

    /// relational := primary ( ('>' | '<' | '>=' | '<=') primary )*
    fn relational(&mut self, expected: &str) -> Result<Subtree> {
        let mut left = self.primary(expected)?;

        while let Some(operator) = self.eat_if(TokenKind::Relational)? {
            let right = self.primary(&right_operand(&operator))?;
            left = fold(BranchKind::Binary, operator, left, right)?;
        }

        Ok(left)
    }

    /// primary := literal | identifier | '(' logicalOr ')'
    fn primary(&mut self, expected: &str) -> Result<Subtree> {
        let Some(token) = self.lookahead else {
            return Err(RuleError::syntax(expected, END_OF_INPUT));
        };

        let leaf = match token.kind {
            TokenKind::Number => LeafKind::NumericLiteral,
            TokenKind::String => LeafKind::StringLiteral,
            // true/false/null 在语法层面识别
            TokenKind::Identifier => match token.text {
                "true" | "false" => LeafKind::BooleanLiteral,
                "null" => LeafKind::NullLiteral,
                _ => LeafKind::Identifier,
            },
            TokenKind::LeftParen => return self.parenthesized(),
            _ => return Err(RuleError::syntax(expected, token.to_string())),
        };

        self.advance()?;
        Ok((Node::leaf(leaf, token.text), 1))
    }

    fn parenthesized(&mut self) -> Result<Subtree> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(RuleError::syntax(
                format!("嵌套深度不超过 {}", MAX_NESTING_DEPTH),
                self.describe_lookahead(),
            ));
        }

        self.advance()?;
        self.depth += 1;
        let inner = self.logical_or("表达式")?;
        self.depth -= 1;

        match self.lookahead {
            Some(token) if token.kind == TokenKind::RightParen => {
                self.advance()?;
                Ok(inner)
            }
            Some(token) => Err(RuleError::syntax("')'", token.to_string())),
            None => Err(RuleError::syntax("')'", END_OF_INPUT)),
        }
    }

    /// 当前 Token 类型匹配时消费并返回它
    fn eat_if(&mut self, kind: TokenKind) -> Result<Option<Token<'a>>> {
        match self.lookahead {
            Some(token) if token.kind == kind => self.advance(),
            _ => Ok(None),
        }
    }

    /// 前进一个 Token，返回被消费的 Token
    fn advance(&mut self) -> Result<Option<Token<'a>>> {
        let current = self.lookahead.take();
        self.lookahead = self.tokenizer.next_token()?;
        Ok(current)
    }

    fn describe_lookahead(&self) -> String {
        self.lookahead
            .map(|token| token.to_string())
            .unwrap_or_else(|| END_OF_INPUT.to_string())
    }
}

/// 已解析的子树及其深度
type Subtree = (Node, usize);

/// 将运算符两侧合并为分支节点，树深度超过上限时报错
fn fold(kind: BranchKind, operator: Token<'_>, left: Subtree, right: Subtree) -> Result<Subtree> {
    let (left, left_depth) = left;
    let (right, right_depth) = right;
    let depth = 1 + left_depth.max(right_depth);

    if depth > MAX_TREE_DEPTH {
        return Err(RuleError::syntax(
            format!("表达式树深度不超过 {}", MAX_TREE_DEPTH),
            operator.to_string(),
        ));
    }

    Ok((Node::branch(kind, operator.text, left, right), depth))
}

fn right_operand(operator: &Token<'_>) -> String {
    format!("'{}' 的右操作数", operator.text)
}

/// 解析规则文本为表达式树
pub fn parse(rule_text: &str) -> Result<Node> {
    Parser::new(rule_text).parse()
}
