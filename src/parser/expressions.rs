//! 表达式解析
//!
//! 优先级由低到高：`&&`、`<`、`+ -`、`* /`、`!`、后缀、基本表达式。
//! 二元运算左结合，得到向左倾斜的运算链。

use crate::ast::*;
use crate::error::JmmResult;
use crate::lexer::Token;
use super::Parser;

/// 解析表达式（入口点）
pub fn parse_expression(parser: &mut Parser) -> JmmResult<Expr> {
    parse_and(parser)
}

fn binary(parser: &mut Parser, op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    let loc = lhs.loc;
    parser.make_expr(
        ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        loc,
    )
}

/// 解析逻辑与表达式
fn parse_and(parser: &mut Parser) -> JmmResult<Expr> {
    let mut left = parse_comparison(parser)?;

    while parser.match_token(&Token::AndAnd) {
        let right = parse_comparison(parser)?;
        left = binary(parser, BinaryOp::And, left, right);
    }

    Ok(left)
}

/// 解析比较表达式
fn parse_comparison(parser: &mut Parser) -> JmmResult<Expr> {
    let mut left = parse_term(parser)?;

    while parser.match_token(&Token::Lt) {
        let right = parse_term(parser)?;
        left = binary(parser, BinaryOp::Lt, left, right);
    }

    Ok(left)
}

/// 解析加减表达式
fn parse_term(parser: &mut Parser) -> JmmResult<Expr> {
    let mut left = parse_factor(parser)?;

    loop {
        let op = match parser.current_token() {
            Token::Plus => BinaryOp::Add,
            Token::Minus => BinaryOp::Sub,
            _ => break,
        };
        parser.advance();
        let right = parse_factor(parser)?;
        left = binary(parser, op, left, right);
    }

    Ok(left)
}

/// 解析乘除表达式
fn parse_factor(parser: &mut Parser) -> JmmResult<Expr> {
    let mut left = parse_unary(parser)?;

    loop {
        let op = match parser.current_token() {
            Token::Star => BinaryOp::Mul,
            Token::Slash => BinaryOp::Div,
            _ => break,
        };
        parser.advance();
        let right = parse_unary(parser)?;
        left = binary(parser, op, left, right);
    }

    Ok(left)
}

/// 解析一元表达式
fn parse_unary(parser: &mut Parser) -> JmmResult<Expr> {
    let loc = parser.current_loc();
    if parser.match_token(&Token::Bang) {
        let operand = parse_unary(parser)?;
        return Ok(parser.make_expr(ExprKind::Not(Box::new(operand)), loc));
    }
    parse_postfix(parser)
}

/// 解析后缀表达式：数组下标、`.length`、方法调用
fn parse_postfix(parser: &mut Parser) -> JmmResult<Expr> {
    let mut expr = parse_primary(parser)?;

    loop {
        let loc = parser.current_loc();
        if parser.match_token(&Token::LBracket) {
            let index = parse_expression(parser)?;
            parser.consume(&Token::RBracket, "Expected ']' after array index")?;
            expr = parser.make_expr(
                ExprKind::ArrayAccess {
                    array: Box::new(expr),
                    index: Box::new(index),
                },
                loc,
            );
        } else if parser.match_token(&Token::Dot) {
            if parser.match_token(&Token::Length) {
                expr = parser.make_expr(ExprKind::Length(Box::new(expr)), loc);
                continue;
            }
            let method = parser.consume_identifier("Expected method name after '.'")?;
            parser.consume(&Token::LParen, "Expected '(' after method name")?;
            let args = parse_arguments(parser)?;
            expr = parser.make_expr(
                ExprKind::MethodCall {
                    target: Box::new(expr),
                    method,
                    args,
                },
                loc,
            );
        } else {
            break;
        }
    }

    Ok(expr)
}

/// 解析实参列表，调用前 `(` 已被消费
fn parse_arguments(parser: &mut Parser) -> JmmResult<Vec<Expr>> {
    let mut args = Vec::new();
    if !parser.check(&Token::RParen) {
        loop {
            args.push(parse_expression(parser)?);
            if !parser.match_token(&Token::Comma) {
                break;
            }
        }
    }
    parser.consume(&Token::RParen, "Expected ')' after arguments")?;
    Ok(args)
}

/// 解析基本表达式
fn parse_primary(parser: &mut Parser) -> JmmResult<Expr> {
    let loc = parser.current_loc();
    let kind = match parser.current_token().clone() {
        Token::IntegerLiteral(Some(value)) => {
            parser.advance();
            ExprKind::IntLiteral(value)
        }
        Token::True => {
            parser.advance();
            ExprKind::BoolLiteral(true)
        }
        Token::False => {
            parser.advance();
            ExprKind::BoolLiteral(false)
        }
        Token::This => {
            parser.advance();
            ExprKind::This
        }
        Token::Identifier(name) => {
            parser.advance();
            ExprKind::Identifier(name)
        }
        Token::LParen => {
            parser.advance();
            let inner = parse_expression(parser)?;
            parser.consume(&Token::RParen, "Expected ')' after expression")?;
            ExprKind::Paren(Box::new(inner))
        }
        Token::New => {
            parser.advance();
            if parser.match_token(&Token::Int) {
                parser.consume(&Token::LBracket, "Expected '[' after 'new int'")?;
                let size = parse_expression(parser)?;
                parser.consume(&Token::RBracket, "Expected ']' after array size")?;
                ExprKind::NewIntArray(Box::new(size))
            } else {
                let class_name = parser.consume_identifier("Expected class name after 'new'")?;
                parser.consume(&Token::LParen, "Expected '(' after class name")?;
                parser.consume(&Token::RParen, "Expected ')' in object creation")?;
                ExprKind::NewObject(class_name)
            }
        }
        _ => return Err(parser.error("Expected expression")),
    };

    Ok(parser.make_expr(kind, loc))
}
