//! 语义分析器核心实现

use std::collections::HashMap;

use crate::ast::*;
use crate::types::Type;
use super::report::Report;
use super::symbol_table::SymbolTable;
use super::type_resolver;

/// 当前所在方法的上下文，进入方法体时重建，之后不可变
#[derive(Debug, Clone, Copy)]
pub struct MethodContext<'m> {
    pub method: &'m str,
    pub is_static: bool,
    pub is_main: bool,
}

impl<'m> MethodContext<'m> {
    pub fn for_method(method: &'m MethodDecl) -> Self {
        Self {
            method: &method.name,
            is_static: method.is_static(),
            is_main: method.is_main(),
        }
    }
}

/// 表达式所处的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Position {
    Value,
    /// 数组下标运算的数组部分
    ArrayBase,
    ArrayIndex,
    /// `if` / `while` 的条件
    Condition(&'static str),
}

/// 子树已报告错误，停止检查该子树
#[derive(Debug)]
pub(super) struct Halted;

pub(super) type Checked<T = ()> = Result<T, Halted>;

/// 语义分析器
pub struct SemanticAnalyzer<'t> {
    pub(super) table: &'t SymbolTable,
    pub(super) reports: Vec<Report>,
    pub(super) annotations: HashMap<ExprId, Type>,
}

impl<'t> SemanticAnalyzer<'t> {
    pub fn new(table: &'t SymbolTable) -> Self {
        Self {
            table,
            reports: Vec::new(),
            annotations: HashMap::new(),
        }
    }

    /// 逐个方法检查，返回诊断和二元运算的类型标注
    pub fn analyze(mut self, program: &Program) -> (Vec<Report>, HashMap<ExprId, Type>) {
        for method in &program.class.methods {
            let ctx = MethodContext::for_method(method);
            log::trace!("analyzing method {}", method.name);
            for stmt in &method.body.statements {
                self.check_statement(&ctx, stmt);
            }
        }
        (self.reports, self.annotations)
    }

    pub(super) fn fail<T>(&mut self, report: Report) -> Checked<T> {
        log::trace!("semantic error: {}", report);
        self.reports.push(report);
        Err(Halted)
    }

    /// 先做结构化推导，推不出来时借助符号表
    pub(super) fn resolve_in_context(&self, ctx: &MethodContext<'_>, expr: &Expr) -> Option<Type> {
        if let Some(annotated) = self.annotations.get(&expr.id) {
            return Some(annotated.clone());
        }
        match &expr.kind {
            ExprKind::Binary { op, .. } => Some(operator_result(*op)),
            _ => type_resolver::resolve(expr).or_else(|| self.resolve_by_symbols(ctx, expr)),
        }
    }

    fn resolve_by_symbols(&self, ctx: &MethodContext<'_>, expr: &Expr) -> Option<Type> {
        match &expr.kind {
            ExprKind::Identifier(name) => self.table.variable_type(ctx.method, name).cloned(),
            ExprKind::This => Some(Type::class(self.table.class_name())),
            ExprKind::MethodCall { method, .. } => self.table.return_type(method).cloned(),
            ExprKind::ArrayAccess { array, .. } => {
                self.resolve_in_context(ctx, array).map(|t| t.element())
            }
            ExprKind::Paren(inner) => self.resolve_in_context(ctx, inner),
            _ => None,
        }
    }

    /// 调用目标是否为导入的类，或类型为导入类的变量
    pub(super) fn is_imported_target(&self, ctx: &MethodContext<'_>, target: &Expr) -> bool {
        let Some(name) = target.as_identifier() else {
            return false;
        };
        match self.table.variable_type(ctx.method, name) {
            Some(ty) => !ty.is_array && self.table.has_import(&ty.name),
            None => self.table.has_import(name),
        }
    }

    pub(super) fn is_compatible(&self, lhs: &Type, rhs: &Type) -> bool {
        is_type_compatible(self.table, lhs, rhs)
    }
}

/// 运算结果类型：比较和逻辑运算得到 boolean，算术运算得到 int
pub(super) fn operator_result(op: BinaryOp) -> Type {
    if op.is_arithmetic() {
        Type::int()
    } else {
        Type::boolean()
    }
}

/// 运算符要求的操作数类型
pub(super) fn operand_requirement(op: BinaryOp) -> Type {
    if op.is_logical() {
        Type::boolean()
    } else {
        Type::int()
    }
}

/// 赋值兼容规则
///
/// `int` 与 `int[]` 互相兼容；基本类型只与自身兼容。
/// 没有父类时，除右侧为当前类外任意两个类类型都兼容；
/// 有父类时，只有左侧为当前类且右侧恰为其父类时不兼容。
pub fn is_type_compatible(table: &SymbolTable, lhs: &Type, rhs: &Type) -> bool {
    if lhs == rhs {
        return true;
    }
    if lhs.is_array != rhs.is_array && lhs.name == crate::types::INT && rhs.name == crate::types::INT {
        return true;
    }
    if lhs.is_primitive() || rhs.is_primitive() {
        return false;
    }
    match table.super_class() {
        None => rhs.name != table.class_name(),
        Some(super_class) => !(lhs.name == table.class_name() && rhs.name == super_class),
    }
}
