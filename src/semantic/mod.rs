//! Java-- 语义分析
//!
//! 先构建符号表，再遍历方法体产生诊断。诊断按遍历顺序累积；
//! 一个子树报告错误后停止检查该子树，兄弟子树照常检查。

pub mod report;
pub mod symbol_table;
pub mod type_resolver;
mod analyzer;
mod expressions;
mod statements;

use std::collections::HashMap;

use crate::ast::{ExprId, Program};
use crate::types::Type;

pub use analyzer::{is_type_compatible, MethodContext, SemanticAnalyzer};
pub use report::{Report, Severity, Stage};
pub use symbol_table::{MethodSignature, SymbolTable, VarOrigin};

/// 语义分析的结果
#[derive(Debug, Clone)]
pub struct SemanticsResult {
    pub table: SymbolTable,
    pub reports: Vec<Report>,
    /// 二元运算节点的类型标注
    pub annotations: HashMap<ExprId, Type>,
}

impl SemanticsResult {
    pub fn has_errors(&self) -> bool {
        self.reports.iter().any(Report::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Report> {
        self.reports.iter().filter(|r| r.is_error())
    }
}

/// 构建符号表并执行语义检查
pub fn analyze(program: &Program) -> SemanticsResult {
    let table = SymbolTable::build(program);
    let (reports, annotations) = SemanticAnalyzer::new(&table).analyze(program);
    log::debug!("analysis finished: {} report(s)", reports.len());
    SemanticsResult {
        table,
        reports,
        annotations,
    }
}
