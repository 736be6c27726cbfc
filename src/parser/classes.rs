//! 导入、类与方法声明的解析

use crate::ast::*;
use crate::error::JmmResult;
use crate::lexer::Token;
use crate::types::{Type, BOOLEAN, INT, VOID};
use super::Parser;
use super::statements::parse_statement;

/// 解析 `import a.b.C;`
pub fn parse_import(parser: &mut Parser) -> JmmResult<ImportDecl> {
    let loc = parser.current_loc();
    parser.consume(&Token::Import, "Expected 'import'")?;

    let mut path = vec![parser.consume_identifier("Expected import path")?];
    while parser.match_token(&Token::Dot) {
        path.push(parser.consume_identifier("Expected identifier after '.' in import")?);
    }

    parser.consume(&Token::Semicolon, "Expected ';' after import")?;
    Ok(ImportDecl { path, loc })
}

/// 解析类声明
pub fn parse_class(parser: &mut Parser) -> JmmResult<ClassDecl> {
    let loc = parser.current_loc();
    parser.match_token(&Token::Public);
    parser.consume(&Token::Class, "Expected 'class' keyword")?;

    let name = parser.consume_identifier("Expected class name")?;

    let super_class = if parser.match_token(&Token::Extends) {
        Some(parser.consume_identifier("Expected superclass name")?)
    } else {
        None
    };

    parser.consume(&Token::LBrace, "Expected '{' after class declaration")?;

    let mut fields = Vec::new();
    let mut methods = Vec::new();
    while !parser.check(&Token::RBrace) && !parser.is_at_end() {
        // 向前看判断是字段或方法
        let checkpoint = parser.pos;
        skip_modifiers(parser);
        if parser.check(&Token::Void) {
            parser.pos = checkpoint;
            methods.push(parse_method(parser)?);
            continue;
        }
        parse_type(parser)?;
        parser.consume_identifier("Expected member name")?;
        let is_method = parser.check(&Token::LParen);
        parser.pos = checkpoint;

        if is_method {
            methods.push(parse_method(parser)?);
        } else {
            skip_modifiers(parser);
            fields.push(parse_var_decl(parser)?);
        }
    }

    parser.consume(&Token::RBrace, "Expected '}' after class body")?;

    Ok(ClassDecl {
        name,
        super_class,
        fields,
        methods,
        loc,
    })
}

fn skip_modifiers(parser: &mut Parser) {
    while parser.match_token(&Token::Public)
        || parser.match_token(&Token::Private)
        || parser.match_token(&Token::Static)
    {}
}

/// 解析方法声明；`static void main(String[] x)` 视为入口方法
pub fn parse_method(parser: &mut Parser) -> JmmResult<MethodDecl> {
    let loc = parser.current_loc();

    let mut is_public = false;
    let mut is_static = false;
    loop {
        if parser.match_token(&Token::Public) {
            is_public = true;
        } else if parser.match_token(&Token::Private) {
            is_public = false;
        } else if parser.match_token(&Token::Static) {
            is_static = true;
        } else {
            break;
        }
    }

    let return_type = parse_type(parser)?;
    let name = parser.consume_identifier("Expected method name")?;

    parser.consume(&Token::LParen, "Expected '(' after method name")?;
    let mut params = Vec::new();
    if !parser.check(&Token::RParen) {
        loop {
            let param_loc = parser.current_loc();
            let var_type = parse_type(parser)?;
            let param_name = parser.consume_identifier("Expected parameter name")?;
            params.push(VarDecl { name: param_name, var_type, loc: param_loc });
            if !parser.match_token(&Token::Comma) {
                break;
            }
        }
    }
    parser.consume(&Token::RParen, "Expected ')' after parameters")?;

    let is_main = name == "main"
        && is_static
        && return_type.is_void()
        && params.len() == 1
        && params[0].var_type == Type::new("String", true);
    let kind = if is_main {
        MethodKind::Main
    } else {
        MethodKind::Regular { is_static }
    };

    let body_loc = parser.current_loc();
    parser.consume(&Token::LBrace, "Expected '{' before method body")?;

    let mut locals = Vec::new();
    let mut statements = Vec::new();
    while !parser.check(&Token::RBrace) && !parser.is_at_end() {
        if is_var_decl_start(parser) {
            locals.push(parse_var_decl(parser)?);
        } else {
            statements.push(parse_statement(parser)?);
        }
    }
    parser.consume(&Token::RBrace, "Expected '}' after method body")?;

    Ok(MethodDecl {
        name,
        kind,
        is_public,
        return_type,
        params,
        locals,
        body: Block { statements, loc: body_loc },
        loc,
    })
}

/// 解析 `Type name;`
pub fn parse_var_decl(parser: &mut Parser) -> JmmResult<VarDecl> {
    let loc = parser.current_loc();
    let var_type = parse_type(parser)?;
    let name = parser.consume_identifier("Expected variable name")?;
    parser.consume(&Token::Semicolon, "Expected ';' after variable declaration")?;
    Ok(VarDecl { name, var_type, loc })
}

/// 解析类型：`int`、`int[]`、`boolean`、`void`、类名或类名数组
pub fn parse_type(parser: &mut Parser) -> JmmResult<Type> {
    let name = match parser.current_token() {
        Token::Int => INT.to_string(),
        Token::Boolean => BOOLEAN.to_string(),
        Token::Void => VOID.to_string(),
        Token::Identifier(name) => name.clone(),
        _ => return Err(parser.error("Expected type")),
    };
    parser.advance();

    let is_array = if parser.check(&Token::LBracket) && parser.peek(1) == &Token::RBracket {
        parser.advance();
        parser.advance();
        true
    } else {
        false
    };

    Ok(Type::new(name, is_array))
}

/// 当前位置是否为局部变量声明
pub fn is_var_decl_start(parser: &Parser) -> bool {
    match parser.current_token() {
        Token::Int | Token::Boolean => true,
        Token::Identifier(_) => match parser.peek(1) {
            Token::Identifier(_) => true,
            Token::LBracket => {
                parser.peek(2) == &Token::RBracket && matches!(parser.peek(3), Token::Identifier(_))
            }
            _ => false,
        },
        _ => false,
    }
}
