//! IR 文本语法分析器
//!
//! 把代码生成器输出的三地址文本还原为 `ClassUnit`。
//! 标签行附加到下一条指令上，方法末尾的标签单独保存。

use crate::error::{JmmError, JmmResult, ir_parse_error};
use crate::ir::lexer::{IrToken, IrTokenWithLine, tokenize};
use crate::ir::*;

pub struct IrParser {
    tokens: Vec<IrTokenWithLine>,
    pos: usize,
}

impl IrParser {
    pub fn new(tokens: Vec<IrTokenWithLine>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn parse(&mut self) -> JmmResult<ClassUnit> {
        let mut imports = Vec::new();
        while self.check_word("import") {
            imports.push(self.parse_import()?);
        }

        let mut unit = self.parse_class_header(imports)?;

        while !self.check(&IrToken::RBrace) {
            self.consume(&IrToken::Dot, "Expected class member")?;
            let member = self.consume_identifier("Expected member directive")?;
            match member.as_str() {
                "field" => unit.fields.push(self.parse_field()?),
                "method" => unit.methods.push(self.parse_method(false)?),
                "construct" => unit.methods.push(self.parse_method(true)?),
                other => return Err(self.error(&format!("Unknown directive '.{}'", other))),
            }
        }
        self.consume(&IrToken::RBrace, "Expected '}' after class body")?;

        if !self.check(&IrToken::Eof) {
            return Err(self.error("Expected end of input after class"));
        }
        Ok(unit)
    }

    fn parse_import(&mut self) -> JmmResult<String> {
        self.advance();
        let mut path = vec![self.consume_identifier("Expected import path")?];
        while self.match_token(&IrToken::Dot) {
            path.push(self.consume_identifier("Expected identifier after '.'")?);
        }
        self.consume(&IrToken::Semicolon, "Expected ';' after import")?;
        Ok(path.join("."))
    }

    fn parse_class_header(&mut self, imports: Vec<String>) -> JmmResult<ClassUnit> {
        let (access, _, _) = self.parse_modifiers();
        let name = self.consume_identifier("Expected class name")?;
        let super_class = if self.check_word("extends") {
            self.advance();
            Some(self.consume_identifier("Expected superclass name")?)
        } else {
            None
        };
        self.consume(&IrToken::LBrace, "Expected '{' after class header")?;

        Ok(ClassUnit {
            imports,
            name,
            access,
            super_class,
            fields: Vec::new(),
            methods: Vec::new(),
        })
    }

    /// 访问修饰符、`static`、`final`，顺序不限
    fn parse_modifiers(&mut self) -> (AccessModifier, bool, bool) {
        let mut access = AccessModifier::Default;
        let mut is_static = false;
        let mut is_final = false;
        loop {
            let word = match self.current_token() {
                IrToken::Identifier(word) => word.clone(),
                _ => break,
            };
            // 修饰符后面必须还有名字，否则它本身就是名字
            if !matches!(self.peek(1), IrToken::Identifier(_)) {
                break;
            }
            if let Some(modifier) = AccessModifier::from_keyword(&word) {
                access = modifier;
            } else if word == "static" {
                is_static = true;
            } else if word == "final" {
                is_final = true;
            } else {
                break;
            }
            self.advance();
        }
        (access, is_static, is_final)
    }

    fn parse_field(&mut self) -> JmmResult<Field> {
        let (access, is_static, is_final) = self.parse_modifiers();
        let name = self.consume_identifier("Expected field name")?;
        let ty = self.parse_suffix()?;
        self.consume(&IrToken::Semicolon, "Expected ';' after field")?;
        Ok(Field { name, access, is_static, is_final, ty })
    }

    fn parse_method(&mut self, is_constructor: bool) -> JmmResult<Method> {
        let (access, is_static, is_final) = if is_constructor {
            (AccessModifier::Public, false, false)
        } else {
            self.parse_modifiers()
        };
        let name = self.consume_identifier("Expected method name")?;

        self.consume(&IrToken::LParen, "Expected '(' after method name")?;
        let mut params = Vec::new();
        if !self.check(&IrToken::RParen) {
            loop {
                params.push(self.parse_element()?);
                if !self.match_token(&IrToken::Comma) {
                    break;
                }
            }
        }
        self.consume(&IrToken::RParen, "Expected ')' after parameters")?;
        let return_type = self.parse_suffix()?;
        self.consume(&IrToken::LBrace, "Expected '{' before method body")?;

        let mut instructions = Vec::new();
        let mut pending = Vec::new();
        while !self.check(&IrToken::RBrace) {
            if self.check(&IrToken::Eof) {
                return Err(self.error("Unterminated method body"));
            }
            if self.is_label() {
                pending.push(self.consume_identifier("Expected label")?);
                self.advance();
                continue;
            }
            let instruction = self.parse_instruction()?;
            self.consume(&IrToken::Semicolon, "Expected ';' after instruction")?;
            instructions.push(Labeled {
                labels: std::mem::take(&mut pending),
                instruction,
            });
        }
        self.consume(&IrToken::RBrace, "Expected '}' after method body")?;

        Ok(Method {
            name,
            access,
            is_static,
            is_final,
            is_constructor,
            params,
            return_type,
            instructions,
            trailing_labels: pending,
        })
    }

    fn is_label(&self) -> bool {
        matches!(self.current_token(), IrToken::Identifier(_)) && matches!(self.peek(1), IrToken::Colon)
    }

    /// 语句中 `;` 之前出现 `:=` 即为赋值
    fn is_assignment(&self) -> bool {
        self.tokens[self.pos..]
            .iter()
            .map(|t| &t.token)
            .take_while(|t| !matches!(t, IrToken::Semicolon | IrToken::RBrace | IrToken::Eof))
            .any(|t| matches!(t, IrToken::ColonEq))
    }

    fn parse_instruction(&mut self) -> JmmResult<Instruction> {
        if self.is_assignment() {
            let dest = self.parse_element()?;
            self.consume(&IrToken::ColonEq, "Expected ':='")?;
            let ty = self.parse_suffix()?;
            let rhs = self.parse_rhs()?;
            return Ok(Instruction::Assign { dest, ty, rhs: Box::new(rhs) });
        }

        if self.check_word("goto") && matches!(self.peek(1), IrToken::Identifier(_)) {
            self.advance();
            let label = self.consume_identifier("Expected label after goto")?;
            return Ok(Instruction::Goto(label));
        }

        if self.check_word("if") && matches!(self.peek(1), IrToken::LParen) {
            self.advance();
            self.advance();
            let condition = self.parse_condition()?;
            self.consume(&IrToken::RParen, "Expected ')' after condition")?;
            if !self.check_word("goto") {
                return Err(self.error("Expected 'goto' after condition"));
            }
            self.advance();
            let label = self.consume_identifier("Expected branch label")?;
            return Ok(Instruction::CondBranch { condition: Box::new(condition), label });
        }

        if self.check_word("ret") && matches!(self.peek(1), IrToken::Dot) {
            self.advance();
            let ty = self.parse_suffix()?;
            if self.check(&IrToken::Semicolon) {
                if ty != ElementType::Void {
                    return Err(self.error("Missing return value"));
                }
                return Ok(Instruction::Return(None));
            }
            return Ok(Instruction::Return(Some(self.parse_element()?)));
        }

        self.parse_rhs()
    }

    /// 赋值右侧，也是独立调用语句的形式
    fn parse_rhs(&mut self) -> JmmResult<Instruction> {
        if let IrToken::Identifier(word) = self.current_token().clone() {
            if matches!(self.peek(1), IrToken::LParen) {
                if let Some(kind) = CallKind::from_keyword(&word) {
                    return Ok(Instruction::Call(self.parse_call(kind)?));
                }
                if word == "getfield" || word == "putfield" {
                    return self.parse_field_access(&word);
                }
            }
        }
        self.parse_condition()
    }

    /// `!.bool x`、`a op.T b` 或单个操作数
    fn parse_condition(&mut self) -> JmmResult<Instruction> {
        if let IrToken::Operator(op) = self.current_token().clone() {
            let op = OperationType::from_symbol(&op)
                .filter(|op| *op == OperationType::Not)
                .ok_or_else(|| self.error("Unexpected operator"))?;
            self.advance();
            let ty = self.parse_suffix()?;
            let operand = self.parse_element()?;
            return Ok(Instruction::UnaryOp { operation: Operation { op, ty }, operand });
        }

        let lhs = self.parse_element()?;
        if let IrToken::Operator(op) = self.current_token().clone() {
            let op = OperationType::from_symbol(&op).ok_or_else(|| self.error("Unknown operator"))?;
            self.advance();
            let ty = self.parse_suffix()?;
            let rhs = self.parse_element()?;
            return Ok(Instruction::BinaryOp { lhs, operation: Operation { op, ty }, rhs });
        }
        Ok(Instruction::SingleOp(lhs))
    }

    fn parse_call(&mut self, kind: CallKind) -> JmmResult<CallInstruction> {
        self.advance();
        self.consume(&IrToken::LParen, "Expected '('")?;

        let mut target = None;
        let mut method = None;
        let mut args = Vec::new();

        let is_array_new =
            kind == CallKind::New && self.check_word("array") && matches!(self.peek(1), IrToken::Comma);
        if is_array_new {
            self.advance();
        } else {
            target = Some(self.parse_element()?);
        }

        if matches!(kind, CallKind::InvokeSpecial | CallKind::InvokeVirtual | CallKind::InvokeStatic) {
            self.consume(&IrToken::Comma, "Expected method name")?;
            match self.current_token().clone() {
                IrToken::StringLiteral(text) => {
                    self.advance();
                    method = Some(text.trim_matches('"').to_string());
                }
                _ => return Err(self.error("Expected quoted method name")),
            }
        }

        while self.match_token(&IrToken::Comma) {
            args.push(self.parse_element()?);
        }
        self.consume(&IrToken::RParen, "Expected ')' after call arguments")?;
        let return_type = self.parse_suffix()?;

        Ok(CallInstruction { kind, target, method, args, return_type })
    }

    fn parse_field_access(&mut self, word: &str) -> JmmResult<Instruction> {
        self.advance();
        self.consume(&IrToken::LParen, "Expected '('")?;
        let object = self.parse_element()?;
        self.consume(&IrToken::Comma, "Expected field operand")?;
        let field = self.parse_element()?;

        let instruction = if word == "putfield" {
            self.consume(&IrToken::Comma, "Expected value operand")?;
            let value = self.parse_element()?;
            Instruction::PutField { object, field, value }
        } else {
            Instruction::GetField { object, field }
        };
        self.consume(&IrToken::RParen, "Expected ')'")?;
        self.parse_suffix()?;
        Ok(instruction)
    }

    fn parse_element(&mut self) -> JmmResult<Element> {
        match self.current_token().clone() {
            IrToken::Integer(value) => {
                self.advance();
                let ty = self.parse_suffix()?;
                Ok(Element::Literal { value, ty })
            }
            IrToken::StringLiteral(value) => {
                self.advance();
                if self.check(&IrToken::Dot) {
                    self.parse_suffix()?;
                }
                Ok(Element::Literal { value, ty: ElementType::String })
            }
            IrToken::Identifier(name) => {
                self.advance();
                if name == "this" {
                    if self.check(&IrToken::Dot) {
                        self.parse_suffix()?;
                    }
                    return Ok(Element::Operand { name, ty: ElementType::This });
                }
                if self.match_token(&IrToken::LBracket) {
                    let index = self.parse_element()?;
                    self.consume(&IrToken::RBracket, "Expected ']' after index")?;
                    let ty = self.parse_suffix()?;
                    return Ok(Element::ArrayOperand { name, index: Box::new(index), ty });
                }
                if self.check(&IrToken::Dot) {
                    let ty = self.parse_suffix()?;
                    return Ok(Element::Operand { name, ty });
                }
                let ty = ElementType::Class(name.clone());
                Ok(Element::Operand { name, ty })
            }
            _ => Err(self.error("Expected operand")),
        }
    }

    /// `.i32`、`.array.i32`、`.Foo`
    fn parse_suffix(&mut self) -> JmmResult<ElementType> {
        self.consume(&IrToken::Dot, "Expected type suffix")?;
        self.parse_type()
    }

    fn parse_type(&mut self) -> JmmResult<ElementType> {
        let name = self.consume_identifier("Expected type name")?;
        if name == "array" {
            self.consume(&IrToken::Dot, "Expected array element type")?;
            return Ok(ElementType::Array(Box::new(self.parse_type()?)));
        }
        Ok(ElementType::from_suffix(&name))
    }

    // 辅助方法
    fn current_token(&self) -> &IrToken {
        self.peek(0)
    }

    fn peek(&self, offset: usize) -> &IrToken {
        let index = (self.pos + offset).min(self.tokens.len().saturating_sub(1));
        self.tokens.get(index).map(|t| &t.token).unwrap_or(&IrToken::Eof)
    }

    fn current_line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| t.line)
            .unwrap_or(1)
    }

    fn advance(&mut self) {
        if !matches!(self.current_token(), IrToken::Eof) {
            self.pos += 1;
        }
    }

    fn check(&self, token: &IrToken) -> bool {
        self.current_token() == token
    }

    fn check_word(&self, word: &str) -> bool {
        matches!(self.current_token(), IrToken::Identifier(name) if name == word)
    }

    fn match_token(&mut self, token: &IrToken) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, token: &IrToken, message: &str) -> JmmResult<()> {
        if self.check(token) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(message))
        }
    }

    fn consume_identifier(&mut self, message: &str) -> JmmResult<String> {
        match self.current_token() {
            IrToken::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.error(message)),
        }
    }

    fn error(&self, message: &str) -> JmmError {
        ir_parse_error(self.current_line(), format!("{}, found {}", message, self.current_token()))
    }
}

/// 解析 IR 文本
pub fn parse_ir(source: &str) -> JmmResult<ClassUnit> {
    let tokens = tokenize(source)?;
    let unit = IrParser::new(tokens).parse()?;
    log::debug!("parsed IR class {} with {} method(s)", unit.name, unit.methods.len());
    Ok(unit)
}
