//! 符号表
//!
//! 每个编译单元构建一次，之后只读。构建是单遍前序遍历，
//! 只做登记，不做任何校验，因此不会失败。

use crate::ast::{MethodDecl, Program, VarDecl};
use crate::types::{Symbol, Type, STATIC_VOID};

/// 方法签名：返回类型、有序参数、有序局部变量
#[derive(Debug, Clone)]
pub struct MethodSignature {
    pub name: String,
    pub return_type: Type,
    pub params: Vec<Symbol>,
    pub locals: Vec<Symbol>,
    pub is_static: bool,
}

/// 名字解析结果的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarOrigin {
    Local,
    /// 参数序号，从 0 开始
    Parameter(usize),
    Field,
}

#[derive(Debug, Clone, Copy)]
pub struct Lookup<'a> {
    pub symbol: &'a Symbol,
    pub origin: VarOrigin,
}

#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    imports: Vec<String>,
    class_name: String,
    super_class: Option<String>,
    fields: Vec<Symbol>,
    methods: Vec<MethodSignature>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 AST 构建符号表
    pub fn build(program: &Program) -> Self {
        let mut table = Self::new();

        for import in &program.imports {
            table.add_import(import.qualified_name());
        }

        let class = &program.class;
        table.set_class_name(&class.name);
        if let Some(super_class) = &class.super_class {
            table.set_super_class_name(super_class);
        }

        for field in &class.fields {
            table.add_field(to_symbol(field));
        }

        for method in &class.methods {
            table.register_method(method);
        }

        log::debug!(
            "symbol table built: class={} super={:?} fields={} methods={}",
            table.class_name,
            table.super_class,
            table.fields.len(),
            table.methods.len()
        );
        table
    }

    fn register_method(&mut self, method: &MethodDecl) {
        let return_type = if method.is_main() {
            Type::new(STATIC_VOID, false)
        } else {
            method.return_type.clone()
        };
        let params = method.params.iter().map(to_symbol).collect();
        let locals = method.locals.iter().map(to_symbol).collect();
        self.add_method(&method.name, return_type, params, locals, method.is_static());
    }

    pub fn add_import(&mut self, path: impl Into<String>) {
        self.imports.push(path.into());
    }

    pub fn set_class_name(&mut self, name: impl Into<String>) {
        self.class_name = name.into();
    }

    pub fn set_super_class_name(&mut self, name: impl Into<String>) {
        self.super_class = Some(name.into());
    }

    pub fn add_field(&mut self, field: Symbol) {
        self.fields.push(field);
    }

    pub fn add_method(
        &mut self,
        name: impl Into<String>,
        return_type: Type,
        params: Vec<Symbol>,
        locals: Vec<Symbol>,
        is_static: bool,
    ) {
        self.methods.push(MethodSignature {
            name: name.into(),
            return_type,
            params,
            locals,
            is_static,
        });
    }

    pub fn imports(&self) -> &[String] {
        &self.imports
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn super_class(&self) -> Option<&str> {
        self.super_class.as_deref()
    }

    pub fn fields(&self) -> &[Symbol] {
        &self.fields
    }

    pub fn methods(&self) -> &[MethodSignature] {
        &self.methods
    }

    pub fn method(&self, name: &str) -> Option<&MethodSignature> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn return_type(&self, method: &str) -> Option<&Type> {
        self.method(method).map(|m| &m.return_type)
    }

    pub fn parameters(&self, method: &str) -> Option<&[Symbol]> {
        self.method(method).map(|m| m.params.as_slice())
    }

    pub fn local_variables(&self, method: &str) -> Option<&[Symbol]> {
        self.method(method).map(|m| m.locals.as_slice())
    }

    pub fn field(&self, name: &str) -> Option<&Symbol> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// 按导入路径的最后一段匹配，`a.b.C` 导入名字 `C`
    pub fn has_import(&self, name: &str) -> bool {
        self.imports
            .iter()
            .any(|path| path.rsplit('.').next() == Some(name))
    }

    /// 在方法作用域内解析名字：局部变量、参数、字段依次查找
    pub fn lookup(&self, method: &str, name: &str) -> Option<Lookup<'_>> {
        if let Some(signature) = self.method(method) {
            if let Some(symbol) = signature.locals.iter().find(|s| s.name == name) {
                return Some(Lookup { symbol, origin: VarOrigin::Local });
            }
            if let Some((index, symbol)) = signature
                .params
                .iter()
                .enumerate()
                .find(|(_, s)| s.name == name)
            {
                return Some(Lookup { symbol, origin: VarOrigin::Parameter(index) });
            }
        }
        self.field(name).map(|symbol| Lookup { symbol, origin: VarOrigin::Field })
    }

    /// 名字的声明类型，解析规则同 `lookup`
    pub fn variable_type(&self, method: &str, name: &str) -> Option<&Type> {
        self.lookup(method, name).map(|l| &l.symbol.ty)
    }
}

fn to_symbol(decl: &VarDecl) -> Symbol {
    Symbol::new(&decl.name, decl.var_type.clone())
}
