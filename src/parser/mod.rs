//! Java-- 语法分析器
//!
//! 本模块将词法分析器生成的令牌流解析为抽象语法树 (AST)。

mod classes;
mod statements;
mod expressions;

use crate::ast::{Expr, ExprId, ExprKind, Program};
use crate::error::{JmmError, JmmResult, SourceLocation, parser_error};
use crate::lexer::{Token, TokenWithLocation};

/// 语法分析器
pub struct Parser {
    /// 令牌流，以 `Token::Eof` 结尾
    pub tokens: Vec<TokenWithLocation>,
    /// 当前解析位置
    pub pos: usize,
    /// 下一个表达式编号
    next_expr_id: usize,
}

impl Parser {
    /// 创建新的语法分析器
    pub fn new(tokens: Vec<TokenWithLocation>) -> Self {
        Self { tokens, pos: 0, next_expr_id: 0 }
    }

    /// 解析整个程序
    pub fn parse(&mut self) -> JmmResult<Program> {
        let mut imports = Vec::new();
        while self.check(&Token::Import) {
            imports.push(classes::parse_import(self)?);
        }

        let class = classes::parse_class(self)?;

        if !self.is_at_end() {
            return Err(self.error("Expected end of file after class declaration"));
        }

        Ok(Program { imports, class })
    }

    /// 分配新的表达式节点
    fn make_expr(&mut self, kind: ExprKind, loc: SourceLocation) -> Expr {
        let id = ExprId(self.next_expr_id);
        self.next_expr_id += 1;
        Expr { id, kind, loc }
    }

    // 辅助方法
    fn is_at_end(&self) -> bool {
        matches!(self.current_token(), Token::Eof)
    }

    fn current_token(&self) -> &Token {
        self.peek(0)
    }

    /// 向前看 `offset` 个令牌，越界时返回结尾的 Eof
    fn peek(&self, offset: usize) -> &Token {
        let index = (self.pos + offset).min(self.tokens.len().saturating_sub(1));
        self.tokens
            .get(index)
            .map(|t| &t.token)
            .unwrap_or(&Token::Eof)
    }

    fn current_loc(&self) -> SourceLocation {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| t.loc)
            .unwrap_or_default()
    }

    fn advance(&mut self) -> Token {
        let token = self.current_token().clone();
        if !self.is_at_end() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, token: &Token) -> bool {
        self.current_token() == token
    }

    fn match_token(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, token: &Token, message: &str) -> JmmResult<Token> {
        if self.check(token) {
            Ok(self.advance())
        } else {
            Err(self.error(message))
        }
    }

    fn consume_identifier(&mut self, message: &str) -> JmmResult<String> {
        match self.current_token() {
            Token::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.error(message)),
        }
    }

    fn error(&self, message: &str) -> JmmError {
        let loc = self.current_loc();
        parser_error(
            loc.line,
            loc.column,
            format!("{}, found {}", message, self.current_token()),
        )
    }
}

/// 解析令牌流生成 AST
pub fn parse(tokens: Vec<TokenWithLocation>) -> JmmResult<Program> {
    let mut parser = Parser::new(tokens);
    let program = parser.parse()?;
    log::debug!(
        "parsed class {} with {} method(s)",
        program.class.name,
        program.class.methods.len()
    );
    Ok(program)
}

/// 从源代码直接解析
pub fn parse_source(source: &str) -> JmmResult<Program> {
    parse(crate::lexer::lex(source)?)
}
