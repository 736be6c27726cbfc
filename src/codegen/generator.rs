//! IR 生成器主模块
//!
//! 输出顺序：导入、类头、字段、默认构造器、各方法。

use crate::codegen::context::IRGenerator;
use crate::codegen::types::{symbol_to_ir, type_to_ir};
use crate::ast::*;
use crate::error::JmmResult;

impl<'a> IRGenerator<'a> {
    /// 主入口：生成整个编译单元的 IR 文本
    pub fn generate(&mut self, program: &Program) -> JmmResult<String> {
        let table = self.table;

        for import in table.imports() {
            self.emit_line(&format!("import {};", import));
        }
        if !table.imports().is_empty() {
            self.emit_line("");
        }

        match table.super_class() {
            Some(super_class) => {
                self.emit_line(&format!("public {} extends {} {{", table.class_name(), super_class))
            }
            None => self.emit_line(&format!("public {} {{", table.class_name())),
        }
        self.indent += 1;

        for field in table.fields() {
            self.emit_line(&format!(".field private {};", symbol_to_ir(field)));
        }
        self.emit_line("");

        self.emit_default_constructor();

        for method in &program.class.methods {
            self.emit_line("");
            self.generate_method(method)?;
        }

        self.indent -= 1;
        self.emit_line("}");

        Ok(std::mem::take(&mut self.output))
    }

    fn emit_default_constructor(&mut self) {
        let class_name = self.table.class_name().to_string();
        self.emit_line(&format!(".construct {}().V {{", class_name));
        self.indent += 1;
        self.emit_line("invokespecial(this, \"<init>\").V;");
        self.indent -= 1;
        self.emit_line("}");
    }

    fn generate_method(&mut self, method: &MethodDecl) -> JmmResult<()> {
        log::debug!("lowering method {}", method.name);
        self.begin_method(&method.name);

        let params: Vec<String> = self
            .table
            .parameters(&method.name)
            .unwrap_or_default()
            .iter()
            .map(symbol_to_ir)
            .collect();
        let (modifiers, return_type) = if method.is_main() {
            ("public static", "V".to_string())
        } else if method.is_static() {
            ("public static", type_to_ir(&method.return_type))
        } else {
            ("public", type_to_ir(&method.return_type))
        };
        self.emit_line(&format!(
            ".method {} {}({}).{} {{",
            modifiers,
            method.name,
            params.join(", "),
            return_type
        ));
        self.indent += 1;

        for stmt in &method.body.statements {
            self.generate_statement(stmt)?;
        }

        let ends_with_return = matches!(method.body.statements.last(), Some(Stmt::Return(_)));
        if !ends_with_return && (method.is_main() || method.return_type.is_void()) {
            self.emit_line("ret.V;");
        }

        self.indent -= 1;
        self.emit_line("}");
        Ok(())
    }
}
