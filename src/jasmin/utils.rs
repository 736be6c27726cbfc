//! 类型描述符、加载和存储辅助函数

use crate::error::{JmmResult, internal_error, unsupported};
use crate::ir::{Element, ElementType};
use crate::jasmin::JasminGenerator;
use crate::jasmin::descriptor::Descriptor;

/// 按数值大小选择最紧凑的整数常量加载指令
pub fn literal_instruction(value: i32) -> String {
    match value {
        -1 => "iconst_m1".to_string(),
        0..=5 => format!("iconst_{}", value),
        -128..=127 => format!("bipush {}", value),
        -32768..=32767 => format!("sipush {}", value),
        _ => format!("ldc {}", value),
    }
}

/// 寄存器 0-3 使用 `_n` 形式
pub fn register_suffix(register: usize) -> String {
    if register <= 3 {
        format!("_{}", register)
    } else {
        format!(" {}", register)
    }
}

impl<'a> JasminGenerator<'a> {
    /// 导入表中的完整路径，未导入时原样返回
    pub(super) fn resolve_class(&self, name: &str) -> String {
        self.imports.get(name).cloned().unwrap_or_else(|| name.to_string())
    }

    pub(super) fn jvm_type(&self, ty: &ElementType) -> String {
        match ty {
            ElementType::Int32 => "I".to_string(),
            ElementType::Boolean => "Z".to_string(),
            ElementType::String => "Ljava/lang/String;".to_string(),
            ElementType::Void => "V".to_string(),
            ElementType::Array(inner) => format!("[{}", self.jvm_type(inner)),
            ElementType::Object(name) | ElementType::Class(name) => format!("L{};", self.resolve_class(name)),
            ElementType::This => format!("L{};", self.unit.name),
        }
    }

    /// 变量对应的类名，用于调用和字段指令的所有者
    pub(super) fn owner_of(&self, element: &Element) -> JmmResult<String> {
        match element.ty() {
            ElementType::This => Ok(self.unit.name.clone()),
            ElementType::Object(name) | ElementType::Class(name) => Ok(self.resolve_class(name)),
            other => Err(unsupported(format!("no class owner for operand of type {}", other))),
        }
    }

    fn descriptor(&self, name: &str) -> JmmResult<Descriptor> {
        self.vars
            .get(name)
            .cloned()
            .ok_or_else(|| internal_error(format!("variable '{}' has no register", name)))
    }

    pub(super) fn load_descriptor(&mut self, descriptor: &Descriptor) {
        let instruction = match descriptor.ty {
            ElementType::This => "aload_0".to_string(),
            ElementType::Int32 | ElementType::Boolean => format!("iload{}", register_suffix(descriptor.register)),
            _ => format!("aload{}", register_suffix(descriptor.register)),
        };
        self.emit(&instruction);
        self.stack.push();
    }

    /// 压入一个操作数；数组元素展开为 引用、下标、元素加载
    pub(super) fn load_element(&mut self, element: &Element) -> JmmResult<()> {
        match element {
            Element::Literal { value, ty } => {
                let instruction = match ty {
                    ElementType::Int32 | ElementType::Boolean => {
                        let literal: i32 = value
                            .parse()
                            .map_err(|_| internal_error(format!("invalid integer literal '{}'", value)))?;
                        literal_instruction(literal)
                    }
                    _ => format!("ldc {}", value),
                };
                self.emit(&instruction);
                self.stack.push();
            }
            Element::Operand { name, ty } => {
                if *ty == ElementType::This || name == "this" {
                    self.emit("aload_0");
                    self.stack.push();
                } else {
                    let descriptor = self.descriptor(name)?;
                    self.load_descriptor(&descriptor);
                }
            }
            Element::ArrayOperand { name, index, ty } => {
                let descriptor = self.descriptor(name)?;
                self.load_descriptor(&descriptor);
                self.load_element(index)?;
                self.emit(if ty.is_numeric() { "iaload" } else { "aaload" });
                self.stack.pop(2)?;
                self.stack.push();
            }
        }
        Ok(())
    }

    /// 标量存储，数组元素存储由赋值单独处理
    pub(super) fn store(&mut self, name: &str) -> JmmResult<()> {
        let descriptor = self.descriptor(name)?;
        let family = if descriptor.ty.is_numeric() { "istore" } else { "astore" };
        self.emit(&format!("{}{}", family, register_suffix(descriptor.register)));
        self.stack.pop(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_forms() {
        assert_eq!(literal_instruction(-1), "iconst_m1");
        assert_eq!(literal_instruction(0), "iconst_0");
        assert_eq!(literal_instruction(5), "iconst_5");
        assert_eq!(literal_instruction(6), "bipush 6");
        assert_eq!(literal_instruction(-2), "bipush -2");
        assert_eq!(literal_instruction(127), "bipush 127");
        assert_eq!(literal_instruction(128), "sipush 128");
        assert_eq!(literal_instruction(-32768), "sipush -32768");
        assert_eq!(literal_instruction(32768), "ldc 32768");
        assert_eq!(literal_instruction(i32::MIN), "ldc -2147483648");
    }

    #[test]
    fn test_register_suffix() {
        assert_eq!(register_suffix(0), "_0");
        assert_eq!(register_suffix(3), "_3");
        assert_eq!(register_suffix(4), " 4");
    }
}
