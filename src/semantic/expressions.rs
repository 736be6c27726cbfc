//! 表达式检查

use crate::ast::*;
use crate::error::SourceLocation;
use crate::types::Type;
use super::analyzer::{operand_requirement, operator_result, Checked, Halted, MethodContext, Position, SemanticAnalyzer};
use super::report;
use super::symbol_table::VarOrigin;

impl<'t> SemanticAnalyzer<'t> {
    /// 检查表达式子树，第一个错误生效后停止该子树
    pub(super) fn check_expr(&mut self, ctx: &MethodContext<'_>, expr: &Expr, pos: Position) -> Checked {
        match &expr.kind {
            ExprKind::IntLiteral(_) | ExprKind::BoolLiteral(_) | ExprKind::NewObject(_) => Ok(()),
            ExprKind::Identifier(name) => {
                self.check_identifier(ctx, name, expr.loc, pos == Position::ArrayBase)
            }
            ExprKind::This => {
                if ctx.is_main {
                    return self.fail(report::this_in_main(expr.loc));
                }
                Ok(())
            }
            ExprKind::Binary { .. } => self.check_binary(ctx, expr, pos).map(|_| ()),
            ExprKind::Not(operand) => {
                self.check_expr(ctx, operand, Position::Value)?;
                if let Some(ty) = self.resolve_in_context(ctx, operand) {
                    if !ty.is_boolean() {
                        return self.fail(report::bad_operand_type(expr.loc, "!", &ty));
                    }
                }
                Ok(())
            }
            ExprKind::ArrayAccess { array, index } => {
                self.check_array_access(ctx, expr.loc, array, index)
            }
            ExprKind::Length(array) => {
                self.check_expr(ctx, array, Position::Value)?;
                if let Some(ty) = self.resolve_in_context(ctx, array) {
                    if !ty.is_array {
                        return self.fail(report::array_required(expr.loc, &ty));
                    }
                }
                Ok(())
            }
            ExprKind::MethodCall { .. } => self.check_method_call(ctx, expr).map(|_| ()),
            ExprKind::NewIntArray(size) => {
                self.check_expr(ctx, size, Position::Value)?;
                if let Some(ty) = self.resolve_in_context(ctx, size) {
                    if !ty.is_int() {
                        return self.fail(report::incompatible_types(size.loc, &ty, &Type::int()));
                    }
                }
                Ok(())
            }
            ExprKind::Paren(inner) => self.check_expr(ctx, inner, pos),
        }
    }

    /// 名字必须已声明或为导入的类；静态方法中不能引用字段
    pub(super) fn check_identifier(
        &mut self,
        ctx: &MethodContext<'_>,
        name: &str,
        loc: SourceLocation,
        as_array_base: bool,
    ) -> Checked {
        let table = self.table;
        let Some(found) = table.lookup(ctx.method, name) else {
            if table.has_import(name) {
                return Ok(());
            }
            return self.fail(report::cannot_find_symbol(loc, name));
        };

        if found.origin == VarOrigin::Field && ctx.is_static {
            return self.fail(report::non_static_in_static_context(loc, name));
        }

        if as_array_base && !found.symbol.ty.is_array {
            return self.fail(report::array_access_on_non_array(loc, name));
        }

        Ok(())
    }

    fn check_array_access(
        &mut self,
        ctx: &MethodContext<'_>,
        loc: SourceLocation,
        array: &Expr,
        index: &Expr,
    ) -> Checked {
        self.check_expr(ctx, array, Position::ArrayBase)?;

        match self.resolve_in_context(ctx, array) {
            None => {
                if let Some(name) = array.as_identifier() {
                    return self.fail(report::undefined_array(loc, name));
                }
            }
            Some(ty) if !ty.is_array => return self.fail(report::array_required(loc, &ty)),
            Some(_) => {}
        }

        self.check_expr(ctx, index, Position::ArrayIndex)?;
        self.check_index_type(ctx, loc, index)
    }

    /// 下标必须是 int；嵌套的数组访问本身就是 int
    pub(super) fn check_index_type(&mut self, ctx: &MethodContext<'_>, loc: SourceLocation, index: &Expr) -> Checked {
        if matches!(index.unparen().kind, ExprKind::ArrayAccess { .. }) {
            return Ok(());
        }
        if let Some(ty) = self.resolve_in_context(ctx, index) {
            if !ty.is_int() {
                return self.fail(report::invalid_array_index_type(loc, &ty));
            }
        }
        Ok(())
    }

    /// 检查向左倾斜的二元运算链
    ///
    /// 沿左操作数收集整条链后自内向外逐个检查，不对左侧递归；
    /// 每个节点的结果类型写入标注表，供外层节点和后续阶段使用。
    pub(super) fn check_binary(&mut self, ctx: &MethodContext<'_>, expr: &Expr, pos: Position) -> Checked<Type> {
        let mut chain = Vec::new();
        let mut current = expr;
        while let ExprKind::Binary { lhs, .. } = &current.kind {
            chain.push(current);
            current = lhs.unparen();
        }

        let mut left = self.operand_type(ctx, current)?;

        for node in chain.into_iter().rev() {
            let ExprKind::Binary { op, rhs, .. } = &node.kind else {
                continue;
            };
            let right = self.operand_type(ctx, rhs)?;

            if let Position::Condition(statement) = pos {
                if std::ptr::eq(node, expr) && !op.is_comparison() {
                    if let Some(ty) = &left {
                        if !ty.is_boolean() {
                            return self.fail(report::invalid_condition_type(node.loc, statement, ty));
                        }
                    }
                }
            }

            // 类型未知的操作数（如外部方法调用的结果）按运算符要求的类型处理
            let expected = operand_requirement(*op);
            let lhs_type = left.unwrap_or_else(|| expected.clone());
            let rhs_type = right.unwrap_or_else(|| expected.clone());
            if lhs_type != expected || rhs_type != expected {
                return self.fail(report::operator_cannot_be_applied(
                    node.loc,
                    op.symbol(),
                    &lhs_type,
                    &rhs_type,
                ));
            }

            let result = operator_result(*op);
            self.annotations.insert(node.id, result.clone());
            left = Some(result);
        }

        Ok(left.unwrap_or_else(Type::int))
    }

    /// 先按各自的规则检查操作数，再给出其类型
    fn operand_type(&mut self, ctx: &MethodContext<'_>, operand: &Expr) -> Checked<Option<Type>> {
        let operand = operand.unparen();
        match &operand.kind {
            ExprKind::Identifier(name) => {
                self.check_identifier(ctx, name, operand.loc, false)?;
                Ok(self.table.variable_type(ctx.method, name).cloned())
            }
            ExprKind::MethodCall { .. } => self.check_method_call(ctx, operand),
            ExprKind::ArrayAccess { .. } => {
                self.check_expr(ctx, operand, Position::Value)?;
                Ok(Some(Type::int()))
            }
            ExprKind::Binary { .. } => self.check_binary(ctx, operand, Position::Value).map(Some),
            _ => {
                self.check_expr(ctx, operand, Position::Value)?;
                Ok(self.resolve_in_context(ctx, operand))
            }
        }
    }

    /// 检查方法调用，返回已知的返回类型
    pub(super) fn check_method_call(&mut self, ctx: &MethodContext<'_>, expr: &Expr) -> Checked<Option<Type>> {
        let ExprKind::MethodCall { target, method, args } = &expr.kind else {
            return Ok(None);
        };
        let table = self.table;
        let target = target.unparen();
        let declared = table.method(method);
        let on_this = target.is_this();

        if on_this {
            if ctx.is_main {
                return self.fail(report::this_in_main(expr.loc));
            }
            if ctx.is_static && !declared.is_some_and(|m| m.is_static) {
                return self.fail(report::invalid_static_call(expr.loc, method));
            }
        } else {
            self.check_expr(ctx, target, Position::Value)?;
        }

        // 实参互为兄弟子树，全部检查后再决定是否停止
        let mut halted = false;
        for arg in args {
            if self.check_expr(ctx, arg, Position::Value).is_err() {
                halted = true;
            }
        }
        if halted {
            return Err(Halted);
        }

        let target_name = target.as_identifier();
        let local_receiver = on_this
            || target_name.is_some_and(|name| table.lookup(ctx.method, name).is_some());

        match declared {
            Some(signature) if local_receiver => {
                if args.len() != signature.params.len() {
                    return self.fail(report::wrong_argument_count(expr.loc, method));
                }
                let mut mismatch = false;
                for (index, (arg, param)) in args.iter().zip(&signature.params).enumerate() {
                    if arg.is_this() {
                        continue;
                    }
                    if let Some(found) = self.resolve_in_context(ctx, arg) {
                        if found != param.ty {
                            self.reports.push(report::incompatible_argument(
                                arg.loc, method, index, &param.ty, &found,
                            ));
                            mismatch = true;
                        }
                    }
                }
                if mismatch {
                    return Err(Halted);
                }
            }
            Some(_) => {}
            None => {
                let checked_target = on_this || target_name.is_some();
                if checked_target
                    && !self.is_imported_target(ctx, target)
                    && table.super_class().is_none()
                {
                    return self.fail(report::method_not_declared(expr.loc, method));
                }
            }
        }

        Ok(declared.map(|signature| signature.return_type.clone()))
    }
}
