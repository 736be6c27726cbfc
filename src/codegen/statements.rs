//! 语句代码生成（包含所有控制流结构）

use crate::codegen::context::IRGenerator;
use crate::codegen::types::type_to_ir;
use crate::ast::*;
use crate::error::{internal_error, JmmResult};
use crate::semantic::VarOrigin;
use crate::types::Type;

impl<'a> IRGenerator<'a> {
    /// 生成单个语句代码
    pub fn generate_statement(&mut self, stmt: &Stmt) -> JmmResult<()> {
        match stmt {
            Stmt::Block(block) => {
                for stmt in &block.statements {
                    self.generate_statement(stmt)?;
                }
            }
            Stmt::If(if_stmt) => self.generate_if_statement(if_stmt)?,
            Stmt::While(while_stmt) => self.generate_while_statement(while_stmt)?,
            Stmt::Expr(expr) => self.generate_expression_statement(expr)?,
            Stmt::Assign(assign) => self.generate_assignment(assign)?,
            Stmt::ArrayAssign(assign) => self.generate_array_assignment(assign)?,
            Stmt::Return(ret) => self.generate_return(ret)?,
        }
        Ok(())
    }

    /// if (!cond) goto ElseL; then; goto EndIfL; ElseL: else; EndIfL:
    fn generate_if_statement(&mut self, if_stmt: &IfStmt) -> JmmResult<()> {
        let label = self.new_label();
        let condition = self.generate_expression(&if_stmt.condition, Some(&Type::boolean()))?;
        self.emit_line(&format!("if (!.bool {}) goto Else{};", condition.text, label));

        self.generate_statement(&if_stmt.then_branch)?;
        self.emit_line(&format!("goto EndIf{};", label));

        self.emit_label(&format!("Else{}", label));
        if let Some(else_branch) = &if_stmt.else_branch {
            self.generate_statement(else_branch)?;
        }
        self.emit_label(&format!("EndIf{}", label));
        Ok(())
    }

    /// LoopL: cond; if (!cond) goto EndLoopL; body; goto LoopL; EndLoopL:
    fn generate_while_statement(&mut self, while_stmt: &WhileStmt) -> JmmResult<()> {
        let label = self.new_label();
        self.emit_label(&format!("Loop{}", label));
        let condition = self.generate_expression(&while_stmt.condition, Some(&Type::boolean()))?;
        self.emit_line(&format!("if (!.bool {}) goto EndLoop{};", condition.text, label));

        self.generate_statement(&while_stmt.body)?;
        self.emit_line(&format!("goto Loop{};", label));
        self.emit_label(&format!("EndLoop{}", label));
        Ok(())
    }

    /// 调用语句直接发射调用指令，不绑定临时变量
    fn generate_expression_statement(&mut self, expr: &Expr) -> JmmResult<()> {
        match &expr.unparen().kind {
            ExprKind::MethodCall { .. } => {
                let rhs = self.generate_operation(expr.unparen(), None)?;
                self.emit_line(&format!("{};", rhs.text()));
            }
            _ => {
                self.generate_expression(expr, None)?;
            }
        }
        Ok(())
    }

    fn generate_assignment(&mut self, assign: &AssignStmt) -> JmmResult<()> {
        let table = self.table;
        let found = table
            .lookup(&self.current_method, &assign.target)
            .ok_or_else(|| internal_error(format!("unresolved assignment target '{}'", assign.target)))?;
        let ty = found.symbol.ty.clone();
        let suffix = type_to_ir(&ty);

        if found.origin == VarOrigin::Field {
            let value = self.generate_operand(&assign.value, Some(&ty))?;
            self.emit_line(&format!(
                "putfield(this, {}.{}, {}).V;",
                assign.target, suffix, value.text
            ));
            return Ok(());
        }

        let rhs = self.generate_operation(&assign.value, Some(&ty))?;
        self.emit_line(&format!("{}.{} :=.{} {};", assign.target, suffix, suffix, rhs.text()));
        Ok(())
    }

    fn generate_array_assignment(&mut self, assign: &ArrayAssignStmt) -> JmmResult<()> {
        let array = self.generate_array_base(&assign.target)?;
        let index = self.generate_operand(&assign.index, Some(&Type::int()))?;
        let element = array.ty.element();
        let suffix = type_to_ir(&element);
        let rhs = self.generate_operation(&assign.value, Some(&element))?;
        self.emit_line(&format!(
            "{}[{}].{} :=.{} {};",
            array_name(&array.text),
            index.text,
            suffix,
            suffix,
            rhs.text()
        ));
        Ok(())
    }

    fn generate_return(&mut self, ret: &ReturnStmt) -> JmmResult<()> {
        let return_type = self
            .table
            .return_type(&self.current_method)
            .cloned()
            .unwrap_or_else(Type::void);
        match &ret.value {
            Some(value) => {
                let value = self.generate_expression(value, Some(&return_type))?;
                self.emit_line(&format!("ret.{} {};", type_to_ir(&return_type), value.text));
            }
            None => self.emit_line("ret.V;"),
        }
        Ok(())
    }
}

/// `a.array.i32` → `a`
pub(super) fn array_name(text: &str) -> &str {
    text.split('.').next().unwrap_or(text)
}
