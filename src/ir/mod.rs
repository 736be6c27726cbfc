//! 结构化中间表示
//!
//! 由 `parser` 从 IR 文本重建，供 Jasmin 汇编生成器只读遍历。

pub mod lexer;
pub mod parser;

pub use parser::parse_ir;

use std::fmt;

/// 访问修饰符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessModifier {
    Public,
    Private,
    Protected,
    #[default]
    Default,
}

impl AccessModifier {
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "public" => Some(AccessModifier::Public),
            "private" => Some(AccessModifier::Private),
            "protected" => Some(AccessModifier::Protected),
            "default" => Some(AccessModifier::Default),
            _ => None,
        }
    }

    /// 汇编中的关键字，默认访问权限不输出
    pub fn keyword(&self) -> Option<&'static str> {
        match self {
            AccessModifier::Public => Some("public"),
            AccessModifier::Private => Some("private"),
            AccessModifier::Protected => Some("protected"),
            AccessModifier::Default => None,
        }
    }
}

/// 元素类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementType {
    Int32,
    Boolean,
    String,
    Array(Box<ElementType>),
    /// 对象引用，携带类名
    Object(String),
    /// 静态调用和 `new` 中出现的裸类名
    Class(String),
    This,
    Void,
}

impl ElementType {
    /// 整数和布尔使用 `i` 系列指令，其余使用 `a` 系列
    pub fn is_numeric(&self) -> bool {
        matches!(self, ElementType::Int32 | ElementType::Boolean)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, ElementType::Array(_))
    }

    /// IR 类型后缀解析：`i32`、`bool`、`V`、`String`，其余视为类名
    pub fn from_suffix(name: &str) -> Self {
        match name {
            "i32" => ElementType::Int32,
            "bool" => ElementType::Boolean,
            "V" => ElementType::Void,
            "String" => ElementType::String,
            other => ElementType::Object(other.to_string()),
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::Int32 => write!(f, "i32"),
            ElementType::Boolean => write!(f, "bool"),
            ElementType::String => write!(f, "String"),
            ElementType::Array(inner) => write!(f, "array.{}", inner),
            ElementType::Object(name) | ElementType::Class(name) => write!(f, "{}", name),
            ElementType::This => write!(f, "this"),
            ElementType::Void => write!(f, "V"),
        }
    }
}

/// 指令操作数
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// 字面量，数值或带引号的字符串
    Literal { value: String, ty: ElementType },
    /// 具名变量
    Operand { name: String, ty: ElementType },
    /// 数组元素 `a[i.i32].i32`，类型为元素类型
    ArrayOperand { name: String, index: Box<Element>, ty: ElementType },
}

impl Element {
    pub fn ty(&self) -> &ElementType {
        match self {
            Element::Literal { ty, .. } | Element::Operand { ty, .. } | Element::ArrayOperand { ty, .. } => ty,
        }
    }

    /// 变量名，字面量没有名字
    pub fn name(&self) -> Option<&str> {
        match self {
            Element::Literal { .. } => None,
            Element::Operand { name, .. } | Element::ArrayOperand { name, .. } => Some(name),
        }
    }

    /// 整数字面量的值
    pub fn int_literal(&self) -> Option<i32> {
        match self {
            Element::Literal { value, ty } if ty.is_numeric() => value.parse().ok(),
            _ => None,
        }
    }
}

/// 运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Lte,
    Gt,
    Gte,
    Eq,
    Neq,
    And,
    Or,
    Not,
}

impl OperationType {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "+" => OperationType::Add,
            "-" => OperationType::Sub,
            "*" => OperationType::Mul,
            "/" => OperationType::Div,
            "<" => OperationType::Lt,
            "<=" => OperationType::Lte,
            ">" => OperationType::Gt,
            ">=" => OperationType::Gte,
            "==" => OperationType::Eq,
            "!=" => OperationType::Neq,
            "&&" => OperationType::And,
            "||" => OperationType::Or,
            "!" => OperationType::Not,
            _ => return None,
        };
        Some(op)
    }

    pub fn is_relational(&self) -> bool {
        matches!(
            self,
            OperationType::Lt
                | OperationType::Lte
                | OperationType::Gt
                | OperationType::Gte
                | OperationType::Eq
                | OperationType::Neq
        )
    }
}

/// 带结果类型的运算
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub op: OperationType,
    pub ty: ElementType,
}

/// 调用类指令的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    New,
    InvokeSpecial,
    InvokeVirtual,
    InvokeStatic,
    LoadConstant,
    ArrayLength,
}

impl CallKind {
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "new" => Some(CallKind::New),
            "invokespecial" => Some(CallKind::InvokeSpecial),
            "invokevirtual" => Some(CallKind::InvokeVirtual),
            "invokestatic" => Some(CallKind::InvokeStatic),
            "ldc" => Some(CallKind::LoadConstant),
            "arraylength" => Some(CallKind::ArrayLength),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallInstruction {
    pub kind: CallKind,
    /// 接收者、静态调用的类名、`new` 的类名；数组 `new` 没有
    pub target: Option<Element>,
    /// 方法名，不含引号
    pub method: Option<String>,
    pub args: Vec<Element>,
    pub return_type: ElementType,
}

/// 指令
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Assign { dest: Element, ty: ElementType, rhs: Box<Instruction> },
    BinaryOp { lhs: Element, operation: Operation, rhs: Element },
    UnaryOp { operation: Operation, operand: Element },
    SingleOp(Element),
    Call(CallInstruction),
    GetField { object: Element, field: Element },
    PutField { object: Element, field: Element, value: Element },
    Goto(String),
    CondBranch { condition: Box<Instruction>, label: String },
    Return(Option<Element>),
}

/// 指令及其前面的标签
#[derive(Debug, Clone, PartialEq)]
pub struct Labeled {
    pub labels: Vec<String>,
    pub instruction: Instruction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub access: AccessModifier,
    pub is_static: bool,
    pub is_final: bool,
    pub ty: ElementType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub name: String,
    pub access: AccessModifier,
    pub is_static: bool,
    pub is_final: bool,
    pub is_constructor: bool,
    pub params: Vec<Element>,
    pub return_type: ElementType,
    pub instructions: Vec<Labeled>,
    /// 方法末尾没有后续指令的标签
    pub trailing_labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassUnit {
    pub imports: Vec<String>,
    pub name: String,
    pub access: AccessModifier,
    pub super_class: Option<String>,
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
}
