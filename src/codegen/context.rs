//! IR 生成上下文和状态管理

use crate::semantic::SymbolTable;
use crate::types::Type;

/// 操作数是否为编译期常量
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constancy {
    Constant,
    NotConstant,
}

/// 每个表达式降级后得到的操作数
#[derive(Debug, Clone, PartialEq)]
pub struct IrValue {
    /// 带类型后缀的文本，如 `a.i32`、`14.i32`、`a[i.i32].i32`
    pub text: String,
    pub ty: Type,
    pub constancy: Constancy,
    /// 常量的值，布尔以 0/1 表示
    pub literal: Option<i32>,
    /// 数组元素操作数
    pub indexed: bool,
}

impl IrValue {
    pub fn int_constant(value: i32) -> Self {
        Self {
            text: format!("{}.i32", value),
            ty: Type::int(),
            constancy: Constancy::Constant,
            literal: Some(value),
            indexed: false,
        }
    }

    pub fn bool_constant(value: bool) -> Self {
        let literal = i32::from(value);
        Self {
            text: format!("{}.bool", literal),
            ty: Type::boolean(),
            constancy: Constancy::Constant,
            literal: Some(literal),
            indexed: false,
        }
    }

    /// 按类型构造常量，比较和逻辑运算的结果为布尔
    pub fn constant(value: i32, ty: &Type) -> Self {
        if ty.is_boolean() {
            Self::bool_constant(value != 0)
        } else {
            Self::int_constant(value)
        }
    }

    pub fn variable(text: String, ty: Type) -> Self {
        Self {
            text,
            ty,
            constancy: Constancy::NotConstant,
            literal: None,
            indexed: false,
        }
    }

    pub fn element(text: String, ty: Type) -> Self {
        Self {
            indexed: true,
            ..Self::variable(text, ty)
        }
    }

    pub fn is_constant(&self) -> bool {
        self.constancy == Constancy::Constant
    }
}

/// 赋值右侧：一个操作数，或一条可直接绑定到目标的运算
#[derive(Debug, Clone)]
pub enum Rhs {
    Value(IrValue),
    Operation { text: String, ty: Type },
}

impl Rhs {
    pub fn text(&self) -> &str {
        match self {
            Rhs::Value(value) => &value.text,
            Rhs::Operation { text, .. } => text,
        }
    }
}

/// IR 生成器核心上下文
///
/// 临时变量和标签计数器属于当前方法，进入方法时清零。
pub struct IRGenerator<'a> {
    pub table: &'a SymbolTable,
    pub output: String,
    pub indent: usize,
    pub temp_counter: usize,
    pub label_counter: usize,
    pub current_method: String,
}

impl<'a> IRGenerator<'a> {
    pub fn new(table: &'a SymbolTable) -> Self {
        Self {
            table,
            output: String::new(),
            indent: 0,
            temp_counter: 0,
            label_counter: 0,
            current_method: String::new(),
        }
    }

    /// 进入方法，重置方法内状态
    pub fn begin_method(&mut self, name: &str) {
        self.current_method = name.to_string();
        self.temp_counter = 0;
        self.label_counter = 0;
    }

    /// 发射一行代码
    pub fn emit_line(&mut self, line: &str) {
        if !line.is_empty() {
            self.output.push_str(&"    ".repeat(self.indent));
        }
        self.output.push_str(line);
        self.output.push('\n');
    }

    /// 发射标签，标签不缩进
    pub fn emit_label(&mut self, label: &str) {
        self.output.push_str(label);
        self.output.push_str(":\n");
    }

    /// 创建新的临时变量名，跳过源程序里已有的局部变量、参数和字段名
    pub fn new_temp(&mut self) -> String {
        loop {
            let temp = format!("tmp{}", self.temp_counter);
            self.temp_counter += 1;
            if self.table.lookup(&self.current_method, &temp).is_none() {
                return temp;
            }
        }
    }

    /// 分配新的标签序号，同一结构的各个标签共用
    pub fn new_label(&mut self) -> usize {
        let label = self.label_counter;
        self.label_counter += 1;
        label
    }
}
