//! 指令降级
//!
//! 每条指令按固定模式展开，并同步更新栈深度。
//! 比较运算没有直接产生布尔值的指令，统一用 相减、按符号跳转、两个标签 物化 0/1。

use crate::error::{JmmResult, unsupported};
use crate::ir::*;
use crate::jasmin::JasminGenerator;

/// `iinc` 的立即数范围
const IINC_RANGE: std::ops::RangeInclusive<i32> = -128..=127;

impl<'a> JasminGenerator<'a> {
    /// `in_assignment` 为真时调用结果作为赋值右侧保留在栈上
    pub(super) fn lower_instruction(&mut self, instruction: &Instruction, in_assignment: bool) -> JmmResult<()> {
        match instruction {
            Instruction::Assign { dest, rhs, .. } => self.lower_assign(dest, rhs),
            Instruction::BinaryOp { lhs, operation, rhs } => self.lower_binary(lhs, operation, rhs),
            Instruction::UnaryOp { operation, operand } => self.lower_unary(operation, operand),
            Instruction::SingleOp(element) => self.load_element(element),
            Instruction::Call(call) => self.lower_call(call, in_assignment),
            Instruction::GetField { object, field } => {
                self.load_element(object)?;
                let owner = self.owner_of(object)?;
                let field_name = field.name().unwrap_or_default();
                let instruction = format!("getfield {}/{} {}", owner, field_name, self.jvm_type(field.ty()));
                self.emit(&instruction);
                Ok(())
            }
            Instruction::PutField { object, field, value } => {
                self.load_element(object)?;
                self.load_element(value)?;
                let owner = self.owner_of(object)?;
                let field_name = field.name().unwrap_or_default();
                let instruction = format!("putfield {}/{} {}", owner, field_name, self.jvm_type(field.ty()));
                self.emit(&instruction);
                self.stack.pop(2)
            }
            Instruction::Goto(label) => {
                self.emit(&format!("goto {}", label));
                Ok(())
            }
            Instruction::CondBranch { condition, label } => self.lower_branch(condition, label),
            Instruction::Return(value) => {
                self.has_return = true;
                match value {
                    None => self.emit("return"),
                    Some(value) => {
                        self.load_element(value)?;
                        self.emit(if value.ty().is_numeric() { "ireturn" } else { "areturn" });
                        self.stack.pop(1)?;
                    }
                }
                Ok(())
            }
        }
    }

    fn lower_assign(&mut self, dest: &Element, rhs: &Instruction) -> JmmResult<()> {
        if self.try_increment(dest, rhs) {
            return Ok(());
        }

        match dest {
            Element::ArrayOperand { name, index, ty } => {
                let array = Element::Operand {
                    name: name.clone(),
                    ty: ElementType::Array(Box::new(ty.clone())),
                };
                self.load_element(&array)?;
                self.load_element(index)?;
                self.lower_instruction(rhs, true)?;
                self.emit(if ty.is_numeric() { "iastore" } else { "aastore" });
                self.stack.pop(3)
            }
            Element::Operand { name, .. } => {
                self.lower_instruction(rhs, true)?;
                self.store(name)
            }
            Element::Literal { value, .. } => Err(unsupported(format!("assignment to literal {}", value))),
        }
    }

    /// `x := x + c` 或 `x := c + x` 改写为 `iinc`
    fn try_increment(&mut self, dest: &Element, rhs: &Instruction) -> bool {
        let Element::Operand { name, .. } = dest else {
            return false;
        };
        let Instruction::BinaryOp { lhs, operation, rhs } = rhs else {
            return false;
        };
        if operation.op != OperationType::Add {
            return false;
        }

        let is_dest = |element: &Element| matches!(element, Element::Operand { name: other, .. } if other == name);
        let constant = if is_dest(lhs) {
            rhs.int_literal()
        } else if is_dest(rhs) {
            lhs.int_literal()
        } else {
            None
        };
        let Some(constant) = constant.filter(|c| IINC_RANGE.contains(c)) else {
            return false;
        };

        let register = match self.vars.get(name) {
            Some(descriptor) if descriptor.ty == ElementType::Int32 => descriptor.register,
            _ => return false,
        };
        self.emit(&format!("iinc {} {}", register, constant));
        true
    }

    fn lower_binary(&mut self, lhs: &Element, operation: &Operation, rhs: &Element) -> JmmResult<()> {
        self.load_element(lhs)?;
        self.load_element(rhs)?;

        match operation.op {
            OperationType::Add => self.emit("iadd"),
            OperationType::Sub => self.emit("isub"),
            OperationType::Mul => self.emit("imul"),
            OperationType::Div => self.emit("idiv"),
            OperationType::Or => self.emit("ior"),
            op if op.is_relational() => {
                self.emit("isub");
                self.stack.pop(1)?;
                let branch = compare_opcode(op)?;
                return self.materialize_comparison(branch);
            }
            OperationType::And => {
                // a + b - 2 < 0 当且仅当至少一个操作数为 0
                self.emit("iadd");
                self.stack.pop(1)?;
                self.emit("iconst_2");
                self.stack.push();
                self.emit("isub");
                self.stack.pop(1)?;
                let label = self.next_label();
                self.emit(&format!("iflt ComparisonThen{}", label));
                self.stack.pop(1)?;
                self.emit("iconst_1");
                self.emit(&format!("goto ComparisonEndIf{}", label));
                self.emit_label(&format!("ComparisonThen{}", label));
                self.emit("iconst_0");
                self.emit_label(&format!("ComparisonEndIf{}", label));
                self.stack.push();
                return Ok(());
            }
            other => return Err(unsupported(format!("binary operator {:?}", other))),
        }
        self.stack.pop(1)
    }

    /// 栈顶差值按 `branch` 跳转，两条路径各压入一个 0/1
    fn materialize_comparison(&mut self, branch: &str) -> JmmResult<()> {
        let label = self.next_label();
        self.emit(&format!("{} ComparisonThen{}", branch, label));
        self.stack.pop(1)?;
        self.emit("iconst_0");
        self.emit(&format!("goto ComparisonEndIf{}", label));
        self.emit_label(&format!("ComparisonThen{}", label));
        self.emit("iconst_1");
        self.emit_label(&format!("ComparisonEndIf{}", label));
        self.stack.push();
        Ok(())
    }

    fn lower_unary(&mut self, operation: &Operation, operand: &Element) -> JmmResult<()> {
        if operation.op != OperationType::Not {
            return Err(unsupported(format!("unary operator {:?}", operation.op)));
        }
        self.load_element(operand)?;
        let label = self.next_label();
        self.emit(&format!("ifne NotThen{}", label));
        self.stack.pop(1)?;
        self.emit("iconst_1");
        self.emit(&format!("goto NotEndIf{}", label));
        self.emit_label(&format!("NotThen{}", label));
        self.emit("iconst_0");
        self.emit_label(&format!("NotEndIf{}", label));
        self.stack.push();
        Ok(())
    }

    fn lower_call(&mut self, call: &CallInstruction, in_assignment: bool) -> JmmResult<()> {
        match call.kind {
            CallKind::New => self.lower_new(call)?,
            CallKind::InvokeSpecial | CallKind::InvokeVirtual | CallKind::InvokeStatic => self.lower_invoke(call)?,
            CallKind::LoadConstant => {
                let value = call.target.as_ref().ok_or_else(|| unsupported("ldc without operand"))?;
                self.load_element(value)?;
            }
            CallKind::ArrayLength => {
                let array = call.target.as_ref().ok_or_else(|| unsupported("arraylength without operand"))?;
                self.load_element(array)?;
                self.emit("arraylength");
            }
        }

        if call.return_type != ElementType::Void && !in_assignment {
            self.emit("pop");
            self.stack.pop(1)?;
        }
        Ok(())
    }

    fn lower_new(&mut self, call: &CallInstruction) -> JmmResult<()> {
        match &call.return_type {
            ElementType::Object(name) => {
                self.emit(&format!("new {}", self.resolve_class(name)));
                self.stack.push();
                Ok(())
            }
            ElementType::Array(element) if **element == ElementType::Int32 => {
                if call.args.len() != 1 {
                    return Err(unsupported("multi-dimensional array allocation"));
                }
                self.load_element(&call.args[0])?;
                self.emit("newarray int");
                Ok(())
            }
            other => Err(unsupported(format!("allocation of {}", other))),
        }
    }

    fn lower_invoke(&mut self, call: &CallInstruction) -> JmmResult<()> {
        let target = call.target.as_ref().ok_or_else(|| unsupported("call without target"))?;
        let method = call.method.as_deref().ok_or_else(|| unsupported("call without method name"))?;

        let (opcode, owner) = match call.kind {
            CallKind::InvokeSpecial => {
                let owner = if *target.ty() == ElementType::This {
                    self.super_class.clone()
                } else {
                    self.owner_of(target)?
                };
                ("invokespecial", owner)
            }
            CallKind::InvokeVirtual => ("invokevirtual", self.owner_of(target)?),
            _ => {
                let owner = match target.name() {
                    Some("this") | None => self.unit.name.clone(),
                    Some(name) => self.resolve_class(name),
                };
                ("invokestatic", owner)
            }
        };

        let has_receiver = call.kind != CallKind::InvokeStatic;
        if has_receiver {
            self.load_element(target)?;
        }
        for arg in &call.args {
            self.load_element(arg)?;
        }

        let params: String = call.args.iter().map(|arg| self.jvm_type(arg.ty())).collect();
        let instruction = format!(
            "{} {}/{}({}){}",
            opcode,
            owner,
            method,
            params,
            self.jvm_type(&call.return_type)
        );
        self.emit(&instruction);

        self.stack.pop(call.args.len() + usize::from(has_receiver))?;
        if call.return_type != ElementType::Void {
            self.stack.push();
        }
        Ok(())
    }

    /// 条件跳转按条件的运算符选择跳转序列
    fn lower_branch(&mut self, condition: &Instruction, label: &str) -> JmmResult<()> {
        match condition {
            Instruction::BinaryOp { lhs, operation, rhs } => match operation.op {
                op if op.is_relational() => {
                    self.load_element(lhs)?;
                    self.load_element(rhs)?;
                    self.emit("isub");
                    self.stack.pop(1)?;
                    self.emit(&format!("{} {}", compare_opcode(op)?, label));
                    self.stack.pop(1)
                }
                OperationType::And => {
                    let false_label = format!("FalseAND{}", self.next_label());
                    self.load_element(lhs)?;
                    self.emit(&format!("ifeq {}", false_label));
                    self.stack.pop(1)?;
                    self.load_element(rhs)?;
                    self.emit(&format!("ifeq {}", false_label));
                    self.stack.pop(1)?;
                    self.emit(&format!("goto {}", label));
                    self.emit_label(&false_label);
                    Ok(())
                }
                OperationType::Or => {
                    self.load_element(lhs)?;
                    self.emit(&format!("ifne {}", label));
                    self.stack.pop(1)?;
                    self.load_element(rhs)?;
                    self.emit(&format!("ifne {}", label));
                    self.stack.pop(1)
                }
                other => Err(unsupported(format!("branch on operator {:?}", other))),
            },
            Instruction::UnaryOp { operation, operand } if operation.op == OperationType::Not => {
                self.load_element(operand)?;
                self.emit(&format!("ifeq {}", label));
                self.stack.pop(1)
            }
            Instruction::SingleOp(operand) => {
                self.load_element(operand)?;
                self.emit(&format!("ifne {}", label));
                self.stack.pop(1)
            }
            other => Err(unsupported(format!("branch condition {:?}", other))),
        }
    }
}

/// 相减之后按符号跳转的指令
fn compare_opcode(op: OperationType) -> JmmResult<&'static str> {
    let opcode = match op {
        OperationType::Lt => "iflt",
        OperationType::Lte => "ifle",
        OperationType::Gt => "ifgt",
        OperationType::Gte => "ifge",
        OperationType::Eq => "ifeq",
        OperationType::Neq => "ifne",
        other => return Err(unsupported(format!("comparison operator {:?}", other))),
    };
    Ok(opcode)
}

#[cfg(test)]
mod tests {
    use crate::ir::parse_ir;
    use crate::jasmin::generate_jasmin;

    /// 汇编单个方法体，返回去掉缩进的指令行
    fn body(header: &str, instructions: &str) -> Vec<String> {
        let ir = format!("public A {{\n{} {{\n{}\n}}\n}}", header, instructions);
        let text = generate_jasmin(&parse_ir(&ir).unwrap()).unwrap();
        let start = text.find(".method").unwrap();
        text[start..]
            .lines()
            .skip(1)
            .take_while(|l| *l != ".end method")
            .map(|l| l.trim().to_string())
            .collect()
    }

    #[test]
    fn test_increment_peephole() {
        let lines = body(".method public f(i.i32).i32", "i.i32 :=.i32 i.i32 +.i32 1.i32;\nret.i32 i.i32;");
        assert_eq!(lines, vec![".limit stack 1", ".limit locals 2", "iinc 1 1", "iload_1", "ireturn"]);
    }

    #[test]
    fn test_increment_with_leading_constant_and_negative() {
        let lines = body(".method public f(i.i32).i32", "i.i32 :=.i32 -3.i32 +.i32 i.i32;\nret.i32 i.i32;");
        assert!(lines.contains(&"iinc 1 -3".to_string()));
        assert!(!lines.contains(&"iadd".to_string()));
    }

    #[test]
    fn test_no_increment_out_of_range_or_other_variable() {
        let lines = body(
            ".method public f(i.i32, j.i32).i32",
            "i.i32 :=.i32 i.i32 +.i32 200.i32;\ni.i32 :=.i32 j.i32 +.i32 1.i32;\nret.i32 i.i32;",
        );
        assert!(!lines.iter().any(|l| l.starts_with("iinc")));
        assert_eq!(lines.iter().filter(|l| *l == "iadd").count(), 2);
        assert!(lines.contains(&"sipush 200".to_string()));
    }

    #[test]
    fn test_comparison_materializes_boolean() {
        let lines = body(
            ".method public f(a.i32, b.i32).bool",
            "t.bool :=.bool a.i32 <.bool b.i32;\nret.bool t.bool;",
        );
        let expected = vec![
            ".limit stack 2",
            ".limit locals 4",
            "iload_1",
            "iload_2",
            "isub",
            "iflt ComparisonThen0",
            "iconst_0",
            "goto ComparisonEndIf0",
            "ComparisonThen0:",
            "iconst_1",
            "ComparisonEndIf0:",
            "istore_3",
            "iload_3",
            "ireturn",
        ];
        assert_eq!(lines, expected);
    }

    #[test]
    fn test_logical_and_arithmetic_identity() {
        let lines = body(
            ".method public f(a.bool, b.bool).bool",
            "t.bool :=.bool a.bool &&.bool b.bool;\nret.bool t.bool;",
        );
        let start = lines.iter().position(|l| l == "iadd").unwrap();
        assert_eq!(
            &lines[start..start + 8],
            &[
                "iadd",
                "iconst_2",
                "isub",
                "iflt ComparisonThen0",
                "iconst_1",
                "goto ComparisonEndIf0",
                "ComparisonThen0:",
                "iconst_0",
            ]
        );
        assert_eq!(lines[0], ".limit stack 2");
    }

    #[test]
    fn test_not_uses_own_labels() {
        let lines = body(".method public f(a.bool).bool", "t.bool :=.bool !.bool a.bool;\nret.bool t.bool;");
        assert!(lines.contains(&"ifne NotThen0".to_string()));
        assert!(lines.contains(&"NotEndIf0:".to_string()));
        assert!(!lines.iter().any(|l| l.starts_with("EndIf")));
    }

    #[test]
    fn test_call_statement_pops_result() {
        let lines = body(
            ".method public f().V",
            "invokevirtual(this, \"g\", 1.i32).i32;\nret.V;",
        );
        assert_eq!(
            lines,
            vec![".limit stack 2", ".limit locals 1", "aload_0", "iconst_1", "invokevirtual A/g(I)I", "pop", "return"]
        );
    }

    #[test]
    fn test_call_in_assignment_keeps_result() {
        let lines = body(
            ".method public static f().V",
            "x.i32 :=.i32 invokestatic(io, \"read\").i32;\nret.V;",
        );
        assert_eq!(
            lines,
            vec![".limit stack 1", ".limit locals 1", "invokestatic io/read()I", "istore_0", "return"]
        );
    }

    #[test]
    fn test_static_owner_resolved_through_imports() {
        let ir = "import java.io.Printer;\npublic A {\n.method public static f().V {\ninvokestatic(Printer, \"flush\").V;\nret.V;\n}\n}";
        let text = generate_jasmin(&parse_ir(ir).unwrap()).unwrap();
        assert!(text.contains("invokestatic java/io/Printer/flush()V"));
    }

    #[test]
    fn test_object_allocation_and_constructor_call() {
        let lines = body(
            ".method public static f().V",
            "tmp0.B :=.B new(B).B;\ninvokespecial(tmp0.B, \"<init>\").V;\nret.V;",
        );
        assert_eq!(
            lines,
            vec![
                ".limit stack 1",
                ".limit locals 1",
                "new B",
                "astore_0",
                "aload_0",
                "invokespecial B/<init>()V",
                "return",
            ]
        );
    }

    #[test]
    fn test_array_store_and_load() {
        let lines = body(
            ".method public static f().i32",
            "a.array.i32 :=.array.i32 new(array, 10.i32).array.i32;\n\
             a[2.i32].i32 :=.i32 7.i32;\n\
             x.i32 :=.i32 arraylength(a.array.i32).i32;\n\
             ret.i32 a[x.i32].i32;",
        );
        assert_eq!(
            lines,
            vec![
                ".limit stack 3",
                ".limit locals 2",
                "bipush 10",
                "newarray int",
                "astore_0",
                "aload_0",
                "iconst_2",
                "bipush 7",
                "iastore",
                "aload_0",
                "arraylength",
                "istore_1",
                "aload_0",
                "iload_1",
                "iaload",
                "ireturn",
            ]
        );
    }

    #[test]
    fn test_field_access() {
        let lines = body(
            ".method public f().V",
            "t.i32 :=.i32 getfield(this, count.i32).i32;\nputfield(this, count.i32, t.i32).V;\nret.V;",
        );
        assert!(lines.contains(&"getfield A/count I".to_string()));
        assert!(lines.contains(&"putfield A/count I".to_string()));
        assert_eq!(lines[0], ".limit stack 2");
    }

    #[test]
    fn test_conditional_branches() {
        let lines = body(
            ".method public f(a.i32, b.bool).V",
            "if (!.bool b.bool) goto L1;\nif (a.i32 >=.bool 3.i32) goto L1;\nif (b.bool &&.bool b.bool) goto L1;\n\
             if (b.bool ||.bool b.bool) goto L1;\nif (b.bool) goto L1;\nL1:\nret.V;",
        );
        let expected_fragments = [
            "ifeq L1",
            "ifge L1",
            "ifeq FalseAND0",
            "goto L1",
            "FalseAND0:",
            "ifne L1",
            "L1:",
        ];
        for fragment in expected_fragments {
            assert!(lines.contains(&fragment.to_string()), "missing {}", fragment);
        }
        assert_eq!(lines[0], ".limit stack 2");
    }

    #[test]
    fn test_unsupported_allocation_is_fatal() {
        let ir = "public A {\n.method public static f().V {\na.array.bool :=.array.bool new(array, 1.i32).array.bool;\nret.V;\n}\n}";
        let err = generate_jasmin(&parse_ir(ir).unwrap()).unwrap_err();
        assert!(matches!(err, crate::error::JmmError::Unsupported(_)));
    }
}
