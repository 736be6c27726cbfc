//! 结构化类型推导
//!
//! 只看节点本身，不查符号表。需要上下文才能确定类型的节点
//! （标识符、`this`、方法调用）返回 `None`，由调用方再通过符号表解析。

use crate::ast::{Expr, ExprKind};
use crate::types::Type;

pub fn resolve(expr: &Expr) -> Option<Type> {
    match &expr.kind {
        ExprKind::BoolLiteral(_) => Some(Type::boolean()),
        ExprKind::IntLiteral(_) => Some(Type::int()),
        ExprKind::NewIntArray(_) => Some(Type::int_array()),
        ExprKind::ArrayAccess { array, .. } => resolve(array).map(|t| t.element()),
        ExprKind::Identifier(_) => None,
        ExprKind::Binary { lhs, rhs, .. } => {
            let left = resolve(lhs);
            let right = resolve(rhs);
            match (&left, &right) {
                (Some(l), Some(r)) if l.is_int() && r.is_int() => Some(Type::int()),
                (Some(l), Some(r)) if l.is_boolean() && r.is_boolean() => Some(Type::boolean()),
                _ if matches!(lhs.kind, ExprKind::Binary { .. }) => right,
                _ => None,
            }
        }
        ExprKind::Not(_) => Some(Type::boolean()),
        ExprKind::Length(_) => Some(Type::int()),
        ExprKind::NewObject(class_name) => Some(Type::class(class_name)),
        ExprKind::Paren(inner) => resolve(inner),
        ExprKind::This | ExprKind::MethodCall { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Stmt;
    use crate::parser::parse_source;

    fn resolve_returned(expr_src: &str) -> Option<Type> {
        let program = parse_source(&format!(
            "class A {{ public int f(int x, int[] a) {{ return {}; }} }}",
            expr_src
        ))
        .unwrap();
        let Stmt::Return(ret) = &program.class.methods[0].body.statements[0] else {
            panic!("expected return");
        };
        resolve(ret.value.as_ref().unwrap())
    }

    #[test]
    fn test_literals_and_allocations() {
        assert_eq!(resolve_returned("1"), Some(Type::int()));
        assert_eq!(resolve_returned("false"), Some(Type::boolean()));
        assert_eq!(resolve_returned("new int[3]"), Some(Type::int_array()));
        assert_eq!(resolve_returned("new A()"), Some(Type::class("A")));
        assert_eq!(resolve_returned("new int[3][0]"), Some(Type::int()));
    }

    #[test]
    fn test_identifiers_are_unresolved() {
        assert_eq!(resolve_returned("x"), None);
        assert_eq!(resolve_returned("a[0]"), None);
        assert_eq!(resolve_returned("this"), None);
    }

    #[test]
    fn test_binary_rules() {
        assert_eq!(resolve_returned("1 + 2"), Some(Type::int()));
        assert_eq!(resolve_returned("true && false"), Some(Type::boolean()));
        assert_eq!(resolve_returned("1 + x"), None);
        // 左操作数为二元运算时取右操作数的类型
        assert_eq!(resolve_returned("x + 1 + 2"), Some(Type::int()));
    }
}
