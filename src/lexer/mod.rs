//! Java-- 词法分析器

use logos::Logos;
use crate::error::{JmmResult, lexer_error};
use crate::error::SourceLocation;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\f\r]+")]
#[logos(skip r"//[^\n]*")]
pub enum Token {
    // 关键字
    #[token("import")]
    Import,
    #[token("class")]
    Class,
    #[token("extends")]
    Extends,
    #[token("public")]
    Public,
    #[token("private")]
    Private,
    #[token("static")]
    Static,
    #[token("void")]
    Void,
    #[token("int")]
    Int,
    #[token("boolean")]
    Boolean,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("return")]
    Return,
    #[token("new")]
    New,
    #[token("this")]
    This,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("length")]
    Length,

    // 标识符
    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*", |lex| lex.slice().to_string())]
    Identifier(String),

    // 字面量，超出 i32 范围时为 None，由 Lexer 报错
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i32>().ok())]
    IntegerLiteral(Option<i32>),

    // 运算符
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("<")]
    Lt,
    #[token("&&")]
    AndAnd,
    #[token("!")]
    Bang,
    #[token("=")]
    Assign,

    // 分隔符
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,

    #[token("/*", block_comment)]
    BlockComment,

    #[token("\n")]
    Newline,

    Eof,
}

/// 跳到块注释结尾，未闭合时报错
fn block_comment(lex: &mut logos::Lexer<Token>) -> bool {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            true
        }
        None => false,
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Identifier(name) => write!(f, "identifier '{}'", name),
            Token::IntegerLiteral(Some(value)) => write!(f, "integer {}", value),
            Token::IntegerLiteral(None) => write!(f, "integer literal"),
            Token::Eof => write!(f, "end of file"),
            other => write!(f, "{:?}", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenWithLocation {
    pub token: Token,
    pub loc: SourceLocation,
}

pub struct Lexer<'a> {
    source: &'a str,
    inner: logos::Lexer<'a, Token>,
    line: usize,
    line_start: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            inner: Token::lexer(source),
            line: 1,
            line_start: 0,
        }
    }

    fn location_of(&self, offset: usize) -> SourceLocation {
        SourceLocation::new(self.line, offset - self.line_start + 1)
    }

    pub fn tokenize(&mut self) -> JmmResult<Vec<TokenWithLocation>> {
        let mut tokens = Vec::new();

        while let Some(token_result) = self.inner.next() {
            let span = self.inner.span();
            let loc = self.location_of(span.start);
            match token_result {
                Ok(Token::Newline) => {
                    self.line += 1;
                    self.line_start = span.end;
                }
                Ok(Token::BlockComment) => {
                    // 块注释可能跨行
                    let text = &self.source[span.clone()];
                    if let Some(last) = text.rfind('\n') {
                        self.line += text.matches('\n').count();
                        self.line_start = span.start + last + 1;
                    }
                }
                Ok(Token::IntegerLiteral(None)) => {
                    return Err(lexer_error(
                        loc.line,
                        loc.column,
                        format!("Integer literal out of range: {}", &self.source[span]),
                    ));
                }
                Ok(token) => tokens.push(TokenWithLocation { token, loc }),
                Err(_) => {
                    let error_char = &self.source[span];
                    return Err(lexer_error(
                        loc.line,
                        loc.column,
                        format!("Unexpected character: '{}'", error_char),
                    ));
                }
            }
        }

        let end = self.location_of(self.source.len());
        tokens.push(TokenWithLocation { token: Token::Eof, loc: end });

        Ok(tokens)
    }
}

pub fn lex(source: &str) -> JmmResult<Vec<TokenWithLocation>> {
    let mut lexer = Lexer::new(source);
    let tokens = lexer.tokenize()?;
    log::trace!("lexed {} tokens", tokens.len());
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        lex(source).unwrap().into_iter().map(|t| t.token).collect()
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            kinds("class Foo extends Bar"),
            vec![
                Token::Class,
                Token::Identifier("Foo".to_string()),
                Token::Extends,
                Token::Identifier("Bar".to_string()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("a && !b < 3"),
            vec![
                Token::Identifier("a".to_string()),
                Token::AndAnd,
                Token::Bang,
                Token::Identifier("b".to_string()),
                Token::Lt,
                Token::IntegerLiteral(Some(3)),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_locations_skip_comments() {
        let tokens = lex("// header\n  int x; /* multi\nline */ y").unwrap();
        assert_eq!(tokens[0].token, Token::Int);
        assert_eq!(tokens[0].loc, SourceLocation::new(2, 3));
        let y = tokens.iter().find(|t| t.token == Token::Identifier("y".to_string())).unwrap();
        assert_eq!(y.loc, SourceLocation::new(3, 9));
    }

    #[test]
    fn test_block_comment_forms() {
        let int_only = vec![Token::Int, Token::Eof];
        assert_eq!(kinds("/* a */ int"), int_only);
        assert_eq!(kinds("/** doc */ int"), int_only);
        assert_eq!(kinds("/* a * b */ int"), int_only);
        assert_eq!(kinds("/***/ int"), int_only);
        assert_eq!(
            kinds("a /* x */ * b"),
            vec![
                Token::Identifier("a".to_string()),
                Token::Star,
                Token::Identifier("b".to_string()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_multiline_block_comment_keeps_lines() {
        let tokens = lex("/* multi\nline */ int").unwrap();
        assert_eq!(tokens[0].token, Token::Int);
        assert_eq!(tokens[0].loc, SourceLocation::new(2, 9));
    }

    #[test]
    fn test_unterminated_block_comment_is_error() {
        assert!(lex("int /* never closed").is_err());
    }

    #[test]
    fn test_unexpected_character() {
        let err = lex("int #").unwrap_err();
        assert!(err.to_string().contains("Unexpected character: '#'"));
    }

    #[test]
    fn test_integer_overflow_is_error() {
        assert!(lex("99999999999").is_err());
    }
}
