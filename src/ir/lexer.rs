//! IR 文本词法分析器
//!
//! 指令名和类型后缀都按标识符处理，由语法分析器按上下文区分。

use logos::Logos;
use crate::error::{JmmResult, ir_parse_error};

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\f\r]+")]
#[logos(skip r"//[^\n]*")]
pub enum IrToken {
    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*", |lex| lex.slice().to_string())]
    Identifier(String),

    #[regex(r"-?[0-9]+", |lex| lex.slice().to_string())]
    Integer(String),

    // 保留引号，方法名由语法分析器去除
    #[regex(r#""[^"\n]*""#, |lex| lex.slice().to_string())]
    StringLiteral(String),

    #[token(":=")]
    ColonEq,
    #[token(":")]
    Colon,

    #[token("+", |lex| lex.slice().to_string())]
    #[token("-", |lex| lex.slice().to_string())]
    #[token("*", |lex| lex.slice().to_string())]
    #[token("/", |lex| lex.slice().to_string())]
    #[token("<", |lex| lex.slice().to_string())]
    #[token("<=", |lex| lex.slice().to_string())]
    #[token(">", |lex| lex.slice().to_string())]
    #[token(">=", |lex| lex.slice().to_string())]
    #[token("==", |lex| lex.slice().to_string())]
    #[token("!=", |lex| lex.slice().to_string())]
    #[token("&&", |lex| lex.slice().to_string())]
    #[token("||", |lex| lex.slice().to_string())]
    #[token("!", |lex| lex.slice().to_string())]
    Operator(String),

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

    #[token("\n")]
    Newline,

    Eof,
}

impl std::fmt::Display for IrToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IrToken::Identifier(name) => write!(f, "'{}'", name),
            IrToken::Integer(value) => write!(f, "{}", value),
            IrToken::StringLiteral(text) => write!(f, "{}", text),
            IrToken::Operator(op) => write!(f, "'{}'", op),
            IrToken::Eof => write!(f, "end of input"),
            other => write!(f, "{:?}", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IrTokenWithLine {
    pub token: IrToken,
    pub line: usize,
}

/// 切分 IR 文本，结尾追加 `Eof`
pub fn tokenize(source: &str) -> JmmResult<Vec<IrTokenWithLine>> {
    let mut lexer = IrToken::lexer(source);
    let mut tokens = Vec::new();
    let mut line = 1;

    while let Some(result) = lexer.next() {
        match result {
            Ok(IrToken::Newline) => line += 1,
            Ok(token) => tokens.push(IrTokenWithLine { token, line }),
            Err(_) => {
                return Err(ir_parse_error(
                    line,
                    format!("Unexpected character: '{}'", lexer.slice()),
                ));
            }
        }
    }

    tokens.push(IrTokenWithLine { token: IrToken::Eof, line });
    Ok(tokens)
}
