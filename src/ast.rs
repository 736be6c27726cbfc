//! Java-- 抽象语法树
//!
//! 树在解析后不再变化；每个表达式带唯一的 `ExprId`，
//! 语义分析的类型标注以 `ExprId` 为键存放在旁表中。

use std::fmt;

use crate::error::SourceLocation;
use crate::types::Type;

#[derive(Debug, Clone)]
pub struct Program {
    pub imports: Vec<ImportDecl>,
    pub class: ClassDecl,
}

#[derive(Debug, Clone)]
pub struct ImportDecl {
    pub path: Vec<String>,
    pub loc: SourceLocation,
}

impl ImportDecl {
    /// 点分形式，如 `io.Console`
    pub fn qualified_name(&self) -> String {
        self.path.join(".")
    }
}

#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: String,
    pub super_class: Option<String>,
    pub fields: Vec<VarDecl>,
    pub methods: Vec<MethodDecl>,
    pub loc: SourceLocation,
}

/// 字段、参数和局部变量共用的声明
#[derive(Debug, Clone)]
pub struct VarDecl {
    pub name: String,
    pub var_type: Type,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodKind {
    /// `public static void main(String[] args)`
    Main,
    Regular { is_static: bool },
}

#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub name: String,
    pub kind: MethodKind,
    pub is_public: bool,
    pub return_type: Type,
    pub params: Vec<VarDecl>,
    /// 方法体顶层声明的局部变量，按出现顺序
    pub locals: Vec<VarDecl>,
    pub body: Block,
    pub loc: SourceLocation,
}

impl MethodDecl {
    pub fn is_main(&self) -> bool {
        self.kind == MethodKind::Main
    }

    pub fn is_static(&self) -> bool {
        match self.kind {
            MethodKind::Main => true,
            MethodKind::Regular { is_static } => is_static,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Block(Block),
    If(IfStmt),
    While(WhileStmt),
    Expr(Expr),
    Assign(AssignStmt),
    ArrayAssign(ArrayAssignStmt),
    Return(ReturnStmt),
}

#[derive(Debug, Clone)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_branch: Box<Stmt>,
    pub else_branch: Option<Box<Stmt>>,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Box<Stmt>,
    pub loc: SourceLocation,
}

/// `name = value;`
#[derive(Debug, Clone)]
pub struct AssignStmt {
    pub target: String,
    pub value: Expr,
    pub loc: SourceLocation,
}

/// `name[index] = value;`
#[derive(Debug, Clone)]
pub struct ArrayAssignStmt {
    pub target: String,
    pub index: Expr,
    pub value: Expr,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    pub loc: SourceLocation,
}

impl Stmt {
    pub fn loc(&self) -> SourceLocation {
        match self {
            Stmt::Block(block) => block.loc,
            Stmt::If(stmt) => stmt.loc,
            Stmt::While(stmt) => stmt.loc,
            Stmt::Expr(expr) => expr.loc,
            Stmt::Assign(stmt) => stmt.loc,
            Stmt::ArrayAssign(stmt) => stmt.loc,
            Stmt::Return(stmt) => stmt.loc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(pub usize);

#[derive(Debug, Clone)]
pub struct Expr {
    pub id: ExprId,
    pub kind: ExprKind,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    IntLiteral(i32),
    BoolLiteral(bool),
    Identifier(String),
    This,
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Not(Box<Expr>),
    ArrayAccess {
        array: Box<Expr>,
        index: Box<Expr>,
    },
    Length(Box<Expr>),
    MethodCall {
        target: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
    /// `new int[size]`
    NewIntArray(Box<Expr>),
    /// `new Name()`
    NewObject(String),
    Paren(Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    And,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Lt => "<",
            BinaryOp::And => "&&",
        }
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(self, BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div)
    }

    pub fn is_comparison(&self) -> bool {
        matches!(self, BinaryOp::Lt)
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl Expr {
    /// 去掉括号后的表达式
    pub fn unparen(&self) -> &Expr {
        let mut expr = self;
        while let ExprKind::Paren(inner) = &expr.kind {
            expr = inner;
        }
        expr
    }

    pub fn as_identifier(&self) -> Option<&str> {
        match &self.unparen().kind {
            ExprKind::Identifier(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_this(&self) -> bool {
        matches!(self.unparen().kind, ExprKind::This)
    }
}
