//! 语句解析

use crate::ast::*;
use crate::error::JmmResult;
use crate::lexer::Token;
use super::Parser;
use super::classes::is_var_decl_start;
use super::expressions::parse_expression;

/// 解析单个语句
pub fn parse_statement(parser: &mut Parser) -> JmmResult<Stmt> {
    match parser.current_token() {
        Token::LBrace => Ok(Stmt::Block(parse_block(parser)?)),
        Token::If => parse_if_statement(parser),
        Token::While => parse_while_statement(parser),
        Token::Return => parse_return_statement(parser),
        Token::Identifier(_) if parser.peek(1) == &Token::Assign => parse_assignment(parser),
        _ if is_var_decl_start(parser) => {
            Err(parser.error("Variable declarations are only allowed at the top of a method body"))
        }
        _ => parse_expression_statement(parser),
    }
}

/// 解析语句块
pub fn parse_block(parser: &mut Parser) -> JmmResult<Block> {
    let loc = parser.current_loc();
    parser.consume(&Token::LBrace, "Expected '{'")?;

    let mut statements = Vec::new();
    while !parser.check(&Token::RBrace) && !parser.is_at_end() {
        statements.push(parse_statement(parser)?);
    }

    parser.consume(&Token::RBrace, "Expected '}' after block")?;
    Ok(Block { statements, loc })
}

fn parse_if_statement(parser: &mut Parser) -> JmmResult<Stmt> {
    let loc = parser.current_loc();
    parser.consume(&Token::If, "Expected 'if'")?;
    parser.consume(&Token::LParen, "Expected '(' after 'if'")?;
    let condition = parse_expression(parser)?;
    parser.consume(&Token::RParen, "Expected ')' after if condition")?;

    let then_branch = Box::new(parse_statement(parser)?);
    let else_branch = if parser.match_token(&Token::Else) {
        Some(Box::new(parse_statement(parser)?))
    } else {
        None
    };

    Ok(Stmt::If(IfStmt {
        condition,
        then_branch,
        else_branch,
        loc,
    }))
}

fn parse_while_statement(parser: &mut Parser) -> JmmResult<Stmt> {
    let loc = parser.current_loc();
    parser.consume(&Token::While, "Expected 'while'")?;
    parser.consume(&Token::LParen, "Expected '(' after 'while'")?;
    let condition = parse_expression(parser)?;
    parser.consume(&Token::RParen, "Expected ')' after while condition")?;
    let body = Box::new(parse_statement(parser)?);

    Ok(Stmt::While(WhileStmt { condition, body, loc }))
}

fn parse_return_statement(parser: &mut Parser) -> JmmResult<Stmt> {
    let loc = parser.current_loc();
    parser.consume(&Token::Return, "Expected 'return'")?;
    let value = if parser.check(&Token::Semicolon) {
        None
    } else {
        Some(parse_expression(parser)?)
    };
    parser.consume(&Token::Semicolon, "Expected ';' after return")?;

    Ok(Stmt::Return(ReturnStmt { value, loc }))
}

/// `name = value;`
fn parse_assignment(parser: &mut Parser) -> JmmResult<Stmt> {
    let loc = parser.current_loc();
    let target = parser.consume_identifier("Expected assignment target")?;
    parser.consume(&Token::Assign, "Expected '='")?;
    let value = parse_expression(parser)?;
    parser.consume(&Token::Semicolon, "Expected ';' after assignment")?;

    Ok(Stmt::Assign(AssignStmt { target, value, loc }))
}

/// 表达式语句，或 `name[index] = value;`
fn parse_expression_statement(parser: &mut Parser) -> JmmResult<Stmt> {
    let loc = parser.current_loc();
    let expr = parse_expression(parser)?;

    if parser.check(&Token::Assign) {
        let ExprKind::ArrayAccess { array, index } = expr.kind else {
            return Err(parser.error("Invalid assignment target"));
        };
        let Some(target) = array.as_identifier().map(str::to_string) else {
            return Err(parser.error("Array assignment target must be a variable"));
        };
        parser.advance();
        let value = parse_expression(parser)?;
        parser.consume(&Token::Semicolon, "Expected ';' after assignment")?;
        return Ok(Stmt::ArrayAssign(ArrayAssignStmt {
            target,
            index: *index,
            value,
            loc,
        }));
    }

    parser.consume(&Token::Semicolon, "Expected ';' after expression")?;
    Ok(Stmt::Expr(expr))
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::parser::parse_source;

    fn body(source: &str) -> Vec<Stmt> {
        let program = parse_source(&format!("class A {{ public int f(int[] a) {{ {} }} }}", source)).unwrap();
        program.class.methods[0].body.statements.clone()
    }

    #[test]
    fn test_if_without_else() {
        let stmts = body("if (true) a[0] = 1; return 0;");
        let Stmt::If(if_stmt) = &stmts[0] else { panic!("expected if") };
        assert!(if_stmt.else_branch.is_none());
        assert!(matches!(*if_stmt.then_branch, Stmt::ArrayAssign(_)));
    }

    #[test]
    fn test_while_with_block() {
        let stmts = body("while (a.length < 3) { this.f(a); } return 0;");
        let Stmt::While(while_stmt) = &stmts[0] else { panic!("expected while") };
        let Stmt::Block(block) = &*while_stmt.body else { panic!("expected block") };
        assert!(matches!(block.statements[0], Stmt::Expr(_)));
    }

    #[test]
    fn test_invalid_assignment_target() {
        let result = parse_source("class A { public int f() { this.f() = 1; return 0; } }");
        assert!(result.is_err());
    }
}
