//! Java-- 中间表示生成器
//!
//! 将通过语义检查的 AST 降级为 OLLIR 风格的三地址文本。
//! 按职责拆分为多个子模块。

pub mod context;
pub mod types;
mod expressions;
mod statements;
mod generator;

pub use context::{Constancy, IRGenerator, IrValue, Rhs};
pub use expressions::fold_binary;

use crate::ast::Program;
use crate::error::JmmResult;
use crate::semantic::SymbolTable;

/// 生成整个编译单元的 IR 文本
pub fn generate_ir(program: &Program, table: &SymbolTable) -> JmmResult<String> {
    let mut generator = IRGenerator::new(table);
    generator.generate(program)
}
