//! 表达式代码生成
//!
//! 每个表达式降级为一个操作数（文本、常量性、常量值）。
//! 两个常量操作数的二元运算在生成期求值，不产生临时变量和指令；
//! 其余非常量子表达式各自得到新的临时变量，不做公共子表达式消除。

use crate::codegen::context::{IRGenerator, IrValue, Rhs};
use crate::codegen::statements::array_name;
use crate::codegen::types::type_to_ir;
use crate::ast::*;
use crate::error::{internal_error, JmmResult};
use crate::semantic::VarOrigin;
use crate::types::Type;

impl<'a> IRGenerator<'a> {
    /// 降级表达式；运算结果绑定到新的临时变量
    pub fn generate_expression(&mut self, expr: &Expr, expected: Option<&Type>) -> JmmResult<IrValue> {
        match self.generate_operation(expr, expected)? {
            Rhs::Value(value) => Ok(value),
            Rhs::Operation { text, ty } => Ok(self.bind_temp(&text, ty)),
        }
    }

    /// 降级表达式，数组元素操作数先复制到临时变量
    pub fn generate_operand(&mut self, expr: &Expr, expected: Option<&Type>) -> JmmResult<IrValue> {
        let value = self.generate_expression(expr, expected)?;
        if value.indexed {
            let ty = value.ty.clone();
            return Ok(self.bind_temp(&value.text, ty));
        }
        Ok(value)
    }

    /// `tmpN.T :=.T rhs;`
    fn bind_temp(&mut self, rhs: &str, ty: Type) -> IrValue {
        let temp = self.new_temp();
        let suffix = type_to_ir(&ty);
        self.emit_line(&format!("{}.{} :=.{} {};", temp, suffix, suffix, rhs));
        IrValue::variable(format!("{}.{}", temp, suffix), ty)
    }

    /// 降级表达式，顶层运算不绑定临时变量，交给调用方直接赋值
    pub fn generate_operation(&mut self, expr: &Expr, expected: Option<&Type>) -> JmmResult<Rhs> {
        let value = match &expr.kind {
            ExprKind::IntLiteral(value) => IrValue::int_constant(*value),
            ExprKind::BoolLiteral(value) => IrValue::bool_constant(*value),
            ExprKind::This => IrValue::variable("this".to_string(), Type::class(self.table.class_name())),
            ExprKind::Identifier(name) => return self.generate_identifier(name),
            ExprKind::Paren(inner) => return self.generate_operation(inner, expected),
            ExprKind::Binary { op, lhs, rhs } => return self.generate_binary(*op, lhs, rhs),
            ExprKind::Not(operand) => {
                let operand = self.generate_expression(operand, Some(&Type::boolean()))?;
                if let Some(literal) = operand.literal {
                    IrValue::bool_constant(literal == 0)
                } else {
                    return Ok(Rhs::Operation {
                        text: format!("!.bool {}", operand.text),
                        ty: Type::boolean(),
                    });
                }
            }
            ExprKind::ArrayAccess { array, index } => {
                let array = self.generate_operand(array, Some(&Type::int_array()))?;
                let index = self.generate_operand(index, Some(&Type::int()))?;
                let element = array.ty.element();
                let text = format!("{}[{}].{}", array_name(&array.text), index.text, type_to_ir(&element));
                IrValue::element(text, element)
            }
            ExprKind::Length(array) => {
                let array = self.generate_operand(array, Some(&Type::int_array()))?;
                self.bind_temp(&format!("arraylength({}).i32", array.text), Type::int())
            }
            ExprKind::NewIntArray(size) => {
                let size = self.generate_operand(size, Some(&Type::int()))?;
                self.bind_temp(&format!("new(array, {}).array.i32", size.text), Type::int_array())
            }
            ExprKind::NewObject(class_name) => {
                let value = self.bind_temp(&format!("new({}).{}", class_name, class_name), Type::class(class_name));
                self.emit_line(&format!("invokespecial({}, \"<init>\").V;", value.text));
                value
            }
            ExprKind::MethodCall { target, method, args } => {
                return self.generate_call(target, method, args, expected);
            }
        };
        Ok(Rhs::Value(value))
    }

    fn generate_identifier(&mut self, name: &str) -> JmmResult<Rhs> {
        let table = self.table;
        let found = table
            .lookup(&self.current_method, name)
            .ok_or_else(|| internal_error(format!("unresolved identifier '{}'", name)))?;
        let suffix = type_to_ir(&found.symbol.ty);
        let ty = found.symbol.ty.clone();

        if found.origin == VarOrigin::Field {
            return Ok(Rhs::Operation {
                text: format!("getfield(this, {}.{}).{}", name, suffix, suffix),
                ty,
            });
        }
        Ok(Rhs::Value(IrValue::variable(format!("{}.{}", name, suffix), ty)))
    }

    /// 数组赋值的目标；字段先读取到临时变量
    pub(super) fn generate_array_base(&mut self, name: &str) -> JmmResult<IrValue> {
        match self.generate_identifier(name)? {
            Rhs::Value(value) => Ok(value),
            Rhs::Operation { text, ty } => Ok(self.bind_temp(&text, ty)),
        }
    }

    fn generate_binary(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> JmmResult<Rhs> {
        let operand_type = if op.is_logical() { Type::boolean() } else { Type::int() };
        let result_type = if op.is_arithmetic() { Type::int() } else { Type::boolean() };

        let left = self.generate_expression(lhs, Some(&operand_type))?;
        let right = self.generate_expression(rhs, Some(&operand_type))?;

        if let (Some(a), Some(b)) = (left.literal, right.literal) {
            if let Some(folded) = fold_binary(op, a, b) {
                return Ok(Rhs::Value(IrValue::constant(folded, &result_type)));
            }
        }

        let suffix = type_to_ir(&result_type);
        Ok(Rhs::Operation {
            text: format!("{} {}.{} {}", left.text, op.symbol(), suffix, right.text),
            ty: result_type,
        })
    }

    /// 调用目标为 `this` 或变量时用 invokevirtual，为类名时用 invokestatic
    fn generate_call(
        &mut self,
        target: &Expr,
        method: &str,
        args: &[Expr],
        expected: Option<&Type>,
    ) -> JmmResult<Rhs> {
        let table = self.table;
        let target = target.unparen();

        let (invoke, receiver, receiver_type) = match &target.kind {
            ExprKind::This => ("invokevirtual", "this".to_string(), Some(Type::class(table.class_name()))),
            ExprKind::Identifier(name) if table.lookup(&self.current_method, name).is_none() => {
                ("invokestatic", name.clone(), None)
            }
            _ => {
                let receiver = self.generate_operand(target, None)?;
                let ty = receiver.ty.clone();
                ("invokevirtual", receiver.text, Some(ty))
            }
        };

        let signature = table.method(method);
        let own_class = receiver_type
            .as_ref()
            .is_some_and(|ty| !ty.is_array && ty.name == table.class_name());
        let declared = signature.filter(|_| own_class);

        let mut arg_texts = Vec::with_capacity(args.len());
        for (index, arg) in args.iter().enumerate() {
            let param_type = declared.and_then(|s| s.params.get(index)).map(|p| &p.ty);
            let value = self.generate_operand(arg, param_type)?;
            arg_texts.push(value.text);
        }

        let return_type = declared
            .map(|s| s.return_type.clone())
            .or_else(|| expected.cloned())
            .unwrap_or_else(Type::void);

        let mut text = format!("{}({}, \"{}\"", invoke, receiver, method);
        for arg in &arg_texts {
            text.push_str(", ");
            text.push_str(arg);
        }
        text.push_str(&format!(").{}", type_to_ir(&return_type)));

        Ok(Rhs::Operation { text, ty: return_type })
    }
}

/// 编译期求值；`<` 与 `&&` 以 0/1 表示，除数为零时不折叠
pub fn fold_binary(op: BinaryOp, lhs: i32, rhs: i32) -> Option<i32> {
    match op {
        BinaryOp::Add => Some(lhs.wrapping_add(rhs)),
        BinaryOp::Sub => Some(lhs.wrapping_sub(rhs)),
        BinaryOp::Mul => Some(lhs.wrapping_mul(rhs)),
        BinaryOp::Div => {
            if rhs == 0 {
                None
            } else {
                Some(lhs.wrapping_div(rhs))
            }
        }
        BinaryOp::Lt => Some(i32::from(lhs < rhs)),
        BinaryOp::And => Some(i32::from(lhs >= 1 && rhs >= 1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::context::Constancy;
    use crate::parser::parse_source;
    use crate::semantic::analyze;

    /// 在方法 `f` 中降级其返回表达式，返回操作数和期间发射的代码
    fn lower_returned(source: &str) -> (IrValue, String) {
        let program = parse_source(source).unwrap();
        let semantics = analyze(&program);
        let method = &program.class.methods[0];
        let Some(Stmt::Return(ret)) = method.body.statements.last() else {
            panic!("expected return");
        };
        let mut generator = IRGenerator::new(&semantics.table);
        generator.begin_method(&method.name);
        let value = generator.generate_expression(ret.value.as_ref().unwrap(), None).unwrap();
        (value, generator.output)
    }

    #[test]
    fn test_constant_folding_emits_nothing() {
        let (value, code) = lower_returned("class A { public int f() { return 2 + 3 * 4; } }");
        assert_eq!(value.literal, Some(14));
        assert_eq!(value.constancy, Constancy::Constant);
        assert_eq!(value.text, "14.i32");
        assert!(code.is_empty());
    }

    #[test]
    fn test_boolean_folding() {
        let (value, code) = lower_returned("class A { public boolean f() { return 1 < 2 && !false; } }");
        assert_eq!(value.text, "1.bool");
        assert!(code.is_empty());
    }

    #[test]
    fn test_non_constant_subexpressions_get_fresh_temps() {
        let (value, code) = lower_returned("class A { public int f(int x) { return x * 2 + x * 2; } }");
        assert_eq!(value.text, "tmp2.i32");
        assert_eq!(value.constancy, Constancy::NotConstant);
        let lines: Vec<&str> = code.lines().map(str::trim).collect();
        assert_eq!(
            lines,
            vec![
                "tmp0.i32 :=.i32 x.i32 *.i32 2.i32;",
                "tmp1.i32 :=.i32 x.i32 *.i32 2.i32;",
                "tmp2.i32 :=.i32 tmp0.i32 +.i32 tmp1.i32;",
            ]
        );
    }

    #[test]
    fn test_temps_skip_source_variable_names() {
        let (value, code) = lower_returned(
            "class A { int tmp1; public int f(int x) { int tmp0; tmp0 = 7; return x * 2 + tmp0; } }",
        );
        assert_eq!(value.text, "tmp3.i32");
        let lines: Vec<&str> = code.lines().map(str::trim).collect();
        assert_eq!(
            lines,
            vec![
                "tmp2.i32 :=.i32 x.i32 *.i32 2.i32;",
                "tmp3.i32 :=.i32 tmp2.i32 +.i32 tmp0.i32;",
            ]
        );
    }

    #[test]
    fn test_comparison_result_is_boolean() {
        let (value, code) = lower_returned("class A { public boolean f(int x) { return x < 3; } }");
        assert_eq!(value.text, "tmp0.bool");
        assert_eq!(code.trim(), "tmp0.bool :=.bool x.i32 <.bool 3.i32;");
    }

    #[test]
    fn test_object_and_array_allocation() {
        let (value, code) = lower_returned("class A { public int f() { return new A().g(new int[3]); } public int g(int[] a) { return a.length; } }");
        assert_eq!(value.text, "tmp2.i32");
        let lines: Vec<&str> = code.lines().map(str::trim).collect();
        assert_eq!(
            lines,
            vec![
                "tmp0.A :=.A new(A).A;",
                "invokespecial(tmp0.A, \"<init>\").V;",
                "tmp1.array.i32 :=.array.i32 new(array, 3.i32).array.i32;",
                "tmp2.i32 :=.i32 invokevirtual(tmp0.A, \"g\", tmp1.array.i32).i32;",
            ]
        );
    }

    #[test]
    fn test_indexed_index_is_materialized() {
        let (value, code) = lower_returned("class A { public int f(int[] a) { return a[a[0]]; } }");
        assert_eq!(value.text, "a[tmp0.i32].i32");
        assert!(value.indexed);
        assert_eq!(code.trim(), "tmp0.i32 :=.i32 a[0.i32].i32;");
    }

    #[test]
    fn test_external_call_takes_expected_type() {
        let program = parse_source("import io; class A { public int f() { return 1 + io.read(); } }").unwrap();
        let semantics = analyze(&program);
        let ir = crate::codegen::generate_ir(&program, &semantics.table).unwrap();
        assert!(ir.contains("tmp0.i32 :=.i32 invokestatic(io, \"read\").i32;"));
    }

    #[test]
    fn test_fold_binary_edge_cases() {
        assert_eq!(fold_binary(BinaryOp::Div, 1, 0), None);
        assert_eq!(fold_binary(BinaryOp::Add, i32::MAX, 1), Some(i32::MIN));
        assert_eq!(fold_binary(BinaryOp::And, 1, 0), Some(0));
        assert_eq!(fold_binary(BinaryOp::Lt, 1, 2), Some(1));
    }
}
