//! 局部变量寄存器表
//!
//! 实例方法的 `this` 固定在 0 号寄存器，随后是参数，
//! 其余变量按在指令中首次出现的顺序分配。

use std::collections::HashMap;

use crate::ir::{CallInstruction, Element, ElementType, Instruction, Method};

/// 变量的寄存器编号和声明类型
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    pub register: usize,
    pub ty: ElementType,
}

#[derive(Debug, Default)]
pub struct VarTable {
    vars: HashMap<String, Descriptor>,
    next_register: usize,
}

impl VarTable {
    pub fn build(method: &Method) -> Self {
        let mut table = Self::default();
        if !method.is_static {
            table.insert("this", ElementType::This);
        }
        for param in &method.params {
            table.register(param);
        }
        for labeled in &method.instructions {
            table.register_instruction(&labeled.instruction);
        }
        table
    }

    pub fn get(&self, name: &str) -> Option<&Descriptor> {
        self.vars.get(name)
    }

    /// `.limit locals`：最大寄存器编号加一
    pub fn locals_limit(&self) -> usize {
        self.vars.values().map(|d| d.register + 1).max().unwrap_or(0)
    }

    fn insert(&mut self, name: &str, ty: ElementType) {
        if self.vars.contains_key(name) {
            return;
        }
        let register = self.next_register;
        self.next_register += 1;
        self.vars.insert(name.to_string(), Descriptor { register, ty });
    }

    fn register(&mut self, element: &Element) {
        match element {
            Element::Literal { .. } => {}
            Element::Operand { name, ty } => match ty {
                ElementType::This | ElementType::Class(_) => {}
                _ => self.insert(name, ty.clone()),
            },
            Element::ArrayOperand { name, index, ty } => {
                self.insert(name, ElementType::Array(Box::new(ty.clone())));
                self.register(index);
            }
        }
    }

    fn register_instruction(&mut self, instruction: &Instruction) {
        match instruction {
            Instruction::Assign { dest, rhs, .. } => {
                self.register(dest);
                self.register_instruction(rhs);
            }
            Instruction::BinaryOp { lhs, rhs, .. } => {
                self.register(lhs);
                self.register(rhs);
            }
            Instruction::UnaryOp { operand, .. } => self.register(operand),
            Instruction::SingleOp(element) => self.register(element),
            Instruction::Call(call) => self.register_call(call),
            // 字段名不是局部变量
            Instruction::GetField { object, .. } => self.register(object),
            Instruction::PutField { object, value, .. } => {
                self.register(object);
                self.register(value);
            }
            Instruction::CondBranch { condition, .. } => self.register_instruction(condition),
            Instruction::Return(Some(value)) => self.register(value),
            Instruction::Return(None) | Instruction::Goto(_) => {}
        }
    }

    fn register_call(&mut self, call: &CallInstruction) {
        if let Some(target) = &call.target {
            self.register(target);
        }
        for arg in &call.args {
            self.register(arg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::parse_ir;

    fn table(method: &str) -> VarTable {
        let unit = parse_ir(&format!("public A {{\n{}\n}}", method)).unwrap();
        VarTable::build(&unit.methods[0])
    }

    #[test]
    fn test_instance_method_pins_this() {
        let vars = table(".method public f(x.i32).i32 {\ny.i32 :=.i32 x.i32;\nret.i32 y.i32;\n}");
        assert_eq!(vars.get("this").unwrap().register, 0);
        assert_eq!(vars.get("x").unwrap().register, 1);
        assert_eq!(vars.get("y").unwrap().register, 2);
        assert_eq!(vars.locals_limit(), 3);
    }

    #[test]
    fn test_static_method_starts_at_zero() {
        let vars = table(".method public static main(args.array.String).V {\na.i32 :=.i32 1.i32;\nret.V;\n}");
        assert!(vars.get("this").is_none());
        assert_eq!(vars.get("args").unwrap().register, 0);
        assert_eq!(vars.get("a").unwrap().register, 1);
        assert_eq!(vars.locals_limit(), 2);
    }

    #[test]
    fn test_fields_and_class_names_are_not_registered() {
        let vars = table(
            ".method public f().V {\ntmp0.i32 :=.i32 getfield(this, count.i32).i32;\n\
             invokestatic(io, \"println\", tmp0.i32).V;\nret.V;\n}",
        );
        assert!(vars.get("count").is_none());
        assert!(vars.get("io").is_none());
        assert_eq!(vars.get("tmp0").unwrap().register, 1);
    }

    #[test]
    fn test_array_element_registers_array_type() {
        let vars = table(".method public static f().V {\nb[0.i32].i32 :=.i32 1.i32;\nret.V;\n}");
        assert_eq!(
            vars.get("b").unwrap().ty,
            ElementType::Array(Box::new(ElementType::Int32))
        );
    }
}
