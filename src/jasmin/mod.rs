//! Jasmin 汇编生成器
//!
//! 遍历结构化 IR，输出栈式虚拟机汇编文本。
//! 每个方法独立维护寄存器表、栈深度和内部标签计数器。

pub mod descriptor;
pub mod stack;
mod instructions;
mod utils;

use std::collections::HashMap;

use crate::error::JmmResult;
use crate::ir::{ClassUnit, ElementType, Method};
use descriptor::VarTable;
use stack::StackTracker;

pub use utils::literal_instruction;

const OBJECT_CLASS: &str = "java/lang/Object";

/// 汇编生成器
pub struct JasminGenerator<'a> {
    unit: &'a ClassUnit,
    /// 导入的简单类名到 `a/b/C` 路径
    imports: HashMap<String, String>,
    super_class: String,
    vars: VarTable,
    stack: StackTracker,
    label_counter: usize,
    has_return: bool,
    code: String,
}

impl<'a> JasminGenerator<'a> {
    pub fn new(unit: &'a ClassUnit) -> Self {
        let imports: HashMap<String, String> = unit
            .imports
            .iter()
            .map(|path| {
                let simple = path.rsplit('.').next().unwrap_or(path).to_string();
                (simple, path.replace('.', "/"))
            })
            .collect();
        let super_class = unit
            .super_class
            .as_ref()
            .map(|name| imports.get(name).cloned().unwrap_or_else(|| name.clone()))
            .unwrap_or_else(|| OBJECT_CLASS.to_string());

        Self {
            unit,
            imports,
            super_class,
            vars: VarTable::default(),
            stack: StackTracker::new(),
            label_counter: 0,
            has_return: false,
            code: String::new(),
        }
    }

    /// 生成整个类的汇编文本
    pub fn generate(&mut self) -> JmmResult<String> {
        let unit = self.unit;
        let mut output = String::new();

        output.push_str(".class ");
        if let Some(access) = unit.access.keyword() {
            output.push_str(access);
            output.push(' ');
        }
        output.push_str(&unit.name);
        output.push('\n');
        output.push_str(&format!(".super {}\n\n", self.super_class));

        for field in &unit.fields {
            output.push_str(".field ");
            if let Some(access) = field.access.keyword() {
                output.push_str(access);
                output.push(' ');
            }
            if field.is_static {
                output.push_str("static ");
            }
            if field.is_final {
                output.push_str("final ");
            }
            output.push_str(&format!("{} {}\n", field.name, self.jvm_type(&field.ty)));
        }
        if !unit.fields.is_empty() {
            output.push('\n');
        }

        for method in &unit.methods {
            output.push_str(&self.generate_method(method)?);
            output.push('\n');
        }

        if !unit.methods.iter().any(|m| m.is_constructor) {
            output.push_str(&self.default_constructor());
        }

        Ok(output)
    }

    fn generate_method(&mut self, method: &Method) -> JmmResult<String> {
        self.vars = VarTable::build(method);
        self.stack = StackTracker::new();
        self.label_counter = 0;
        self.has_return = false;
        self.code.clear();

        for labeled in &method.instructions {
            for label in &labeled.labels {
                self.emit_label(label);
            }
            self.lower_instruction(&labeled.instruction, false)?;
        }
        for label in &method.trailing_labels {
            self.emit_label(label);
        }

        let falls_through = !method.trailing_labels.is_empty() && method.return_type == ElementType::Void;
        if !self.has_return || falls_through {
            self.emit("return");
        }

        let mut header = String::from(".method ");
        if let Some(access) = method.access.keyword() {
            header.push_str(access);
            header.push(' ');
        }
        if method.is_static {
            header.push_str("static ");
        }
        if method.is_final {
            header.push_str("final ");
        }
        header.push_str(if method.is_constructor { "<init>" } else { method.name.as_str() });
        header.push('(');
        for param in &method.params {
            header.push_str(&self.jvm_type(param.ty()));
        }
        header.push(')');
        header.push_str(&self.jvm_type(&method.return_type));

        log::debug!(
            "emitted method {}: stack={} locals={}",
            method.name,
            self.stack.max(),
            self.vars.locals_limit()
        );

        Ok(format!(
            "{}\n\t.limit stack {}\n\t.limit locals {}\n{}.end method\n",
            header,
            self.stack.max(),
            self.vars.locals_limit(),
            std::mem::take(&mut self.code)
        ))
    }

    /// IR 中没有构造器时使用的默认构造器
    fn default_constructor(&self) -> String {
        format!(
            ".method public <init>()V\n\t.limit stack 1\n\t.limit locals 1\n\taload_0\n\tinvokespecial {}/<init>()V\n\treturn\n.end method\n",
            self.super_class
        )
    }

    fn emit(&mut self, instruction: &str) {
        self.code.push('\t');
        self.code.push_str(instruction);
        self.code.push('\n');
    }

    fn emit_label(&mut self, label: &str) {
        self.code.push_str(label);
        self.code.push_str(":\n");
    }

    fn next_label(&mut self) -> usize {
        let label = self.label_counter;
        self.label_counter += 1;
        label
    }
}

/// 把结构化 IR 转换为 Jasmin 汇编文本
pub fn generate_jasmin(unit: &ClassUnit) -> JmmResult<String> {
    let mut generator = JasminGenerator::new(unit);
    let assembly = generator.generate()?;
    log::debug!("assembled class {}", unit.name);
    Ok(assembly)
}
