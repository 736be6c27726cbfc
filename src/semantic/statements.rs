//! 语句检查

use crate::ast::*;
use crate::types::Type;
use super::analyzer::{Checked, MethodContext, Position, SemanticAnalyzer};
use super::report;
use super::symbol_table::VarOrigin;

impl<'t> SemanticAnalyzer<'t> {
    /// 检查语句；子树出错不影响兄弟语句
    pub(super) fn check_statement(&mut self, ctx: &MethodContext<'_>, stmt: &Stmt) {
        let checked: Checked = match stmt {
            Stmt::Block(block) => {
                for stmt in &block.statements {
                    self.check_statement(ctx, stmt);
                }
                Ok(())
            }
            Stmt::If(if_stmt) => {
                let result = self.check_condition(ctx, &if_stmt.condition, "if");
                self.check_statement(ctx, &if_stmt.then_branch);
                if let Some(else_branch) = &if_stmt.else_branch {
                    self.check_statement(ctx, else_branch);
                }
                result
            }
            Stmt::While(while_stmt) => {
                let result = self.check_condition(ctx, &while_stmt.condition, "while");
                self.check_statement(ctx, &while_stmt.body);
                result
            }
            Stmt::Expr(expr) => self.check_expr(ctx, expr, Position::Value),
            Stmt::Assign(assign) => self.check_assign(ctx, assign),
            Stmt::ArrayAssign(assign) => self.check_array_assign(ctx, assign),
            Stmt::Return(ret) => self.check_return(ctx, ret),
        };
        // 中止的子树已写入报告，继续检查兄弟语句
        checked.ok();
    }

    /// 条件必须为 boolean；数组访问作为条件时不检查
    fn check_condition(&mut self, ctx: &MethodContext<'_>, condition: &Expr, statement: &'static str) -> Checked {
        let inner = condition.unparen();
        match &inner.kind {
            ExprKind::Binary { .. } => self
                .check_binary(ctx, inner, Position::Condition(statement))
                .map(|_| ()),
            ExprKind::ArrayAccess { .. } => self.check_expr(ctx, inner, Position::Value),
            _ => {
                self.check_expr(ctx, inner, Position::Value)?;
                if let Some(ty) = self.resolve_in_context(ctx, inner) {
                    if !ty.is_boolean() {
                        return self.fail(report::invalid_condition_type(condition.loc, statement, &ty));
                    }
                }
                Ok(())
            }
        }
    }

    fn check_assign(&mut self, ctx: &MethodContext<'_>, assign: &AssignStmt) -> Checked {
        let table = self.table;
        let Some(found) = table.lookup(ctx.method, &assign.target) else {
            return self.fail(report::cannot_find_symbol(assign.loc, &assign.target));
        };
        if found.origin == VarOrigin::Field && ctx.is_static {
            return self.fail(report::non_static_in_static_context(assign.loc, &assign.target));
        }

        self.check_expr(ctx, &assign.value, Position::Value)?;

        let Some(value_type) = self.resolve_in_context(ctx, &assign.value) else {
            return Ok(());
        };
        let target_type = &found.symbol.ty;
        if !self.is_compatible(target_type, &value_type) {
            return self.fail(report::incompatible_types(assign.loc, &value_type, target_type));
        }
        Ok(())
    }

    /// 目标必须是 `int[]`，下标必须是 int
    fn check_array_assign(&mut self, ctx: &MethodContext<'_>, assign: &ArrayAssignStmt) -> Checked {
        let table = self.table;
        let Some(found) = table.lookup(ctx.method, &assign.target) else {
            return self.fail(report::undefined_array(assign.loc, &assign.target));
        };
        if found.origin == VarOrigin::Field && ctx.is_static {
            return self.fail(report::non_static_in_static_context(assign.loc, &assign.target));
        }

        let array_type = &found.symbol.ty;
        if !array_type.is_array {
            return self.fail(report::array_access_on_non_array(assign.loc, &assign.target));
        }
        if *array_type != Type::int_array() {
            return self.fail(report::incompatible_types(assign.loc, array_type, &Type::int_array()));
        }

        self.check_expr(ctx, &assign.index, Position::ArrayIndex)?;
        self.check_index_type(ctx, assign.loc, &assign.index)?;

        self.check_expr(ctx, &assign.value, Position::Value)?;
        let element = array_type.element();
        if let Some(value_type) = self.resolve_in_context(ctx, &assign.value) {
            if !self.is_compatible(&element, &value_type) {
                return self.fail(report::incompatible_types(assign.loc, &value_type, &element));
            }
        }
        Ok(())
    }

    fn check_return(&mut self, ctx: &MethodContext<'_>, ret: &ReturnStmt) -> Checked {
        if ctx.is_main {
            return self.fail(report::return_in_main(ret.loc));
        }

        let expected = self
            .table
            .return_type(ctx.method)
            .cloned()
            .unwrap_or_else(Type::void);

        let Some(value) = &ret.value else {
            if expected.is_void() {
                return Ok(());
            }
            return self.fail(report::incompatible_return_type(ret.loc, ctx.method, &expected, &Type::void()));
        };

        self.check_expr(ctx, value, Position::Value)?;

        // 导入类上的调用视为外部已校验
        let external = match &value.unparen().kind {
            ExprKind::MethodCall { target, .. } => self.is_imported_target(ctx, target.unparen()),
            _ => false,
        };

        match self.resolve_in_context(ctx, value) {
            Some(found) if found != expected && !external => {
                self.fail(report::incompatible_return_type(ret.loc, ctx.method, &expected, &found))
            }
            _ => Ok(()),
        }
    }
}
