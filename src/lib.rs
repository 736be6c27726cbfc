pub mod error;
pub mod config;
pub mod types;
pub mod ast;
pub mod lexer;
pub mod parser;
pub mod semantic;
pub mod codegen;
pub mod ir;
pub mod jasmin;

use std::path::PathBuf;

use config::Config;
use error::{JmmError, JmmResult};
use semantic::{Report, SemanticsResult};

/// 一次完整编译的产物
#[derive(Debug, Clone)]
pub struct CompileOutput {
    pub class_name: String,
    /// 全部诊断，成功时只可能包含警告和提示
    pub reports: Vec<Report>,
    pub ir: String,
    pub assembly: String,
}

pub struct Compiler {
    config: Config,
}

impl Compiler {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 词法、语法和语义分析，诊断不会转换为错误
    pub fn analyze(&self, source: &str) -> JmmResult<SemanticsResult> {
        // 1. 词法分析
        let tokens = lexer::lex(source)?;

        // 2. 语法分析
        let program = parser::parse(tokens)?;

        // 3. 语义分析
        Ok(semantic::analyze(&program))
    }

    /// 生成 IR 文本；存在错误级诊断时停止
    pub fn generate_ir(&self, source: &str) -> JmmResult<String> {
        let program = parser::parse_source(source)?;
        let semantics = checked(semantic::analyze(&program))?;
        codegen::generate_ir(&program, &semantics.table)
    }

    pub fn compile(&self, source: &str) -> JmmResult<CompileOutput> {
        let program = parser::parse_source(source)?;
        let semantics = checked(semantic::analyze(&program))?;

        // 4. 代码生成 - IR
        let ir = codegen::generate_ir(&program, &semantics.table)?;

        // 5. IR 解析与汇编生成
        let assembly = assemble(&ir)?;

        Ok(CompileOutput {
            class_name: program.class.name.clone(),
            reports: semantics.reports,
            ir,
            assembly,
        })
    }

    /// 编译并写出 `<ClassName>.j`，按配置同时写出 `.ollir`，返回汇编文件路径
    pub fn compile_to_files(&self, source: &str) -> JmmResult<PathBuf> {
        let output = self.compile(source)?;
        std::fs::create_dir_all(&self.config.output_dir)?;

        if self.config.emit_ir {
            let ir_path = self.config.output_path(&output.class_name, "ollir");
            std::fs::write(&ir_path, &output.ir)?;
            log::info!("wrote {}", ir_path.display());
        }

        let path = self.config.output_path(&output.class_name, "j");
        std::fs::write(&path, &output.assembly)?;
        log::info!("wrote {}", path.display());
        Ok(path)
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

/// 解析 IR 文本并生成 Jasmin 汇编
pub fn assemble(ir_text: &str) -> JmmResult<String> {
    let unit = ir::parse_ir(ir_text)?;
    jasmin::generate_jasmin(&unit)
}

fn checked(semantics: SemanticsResult) -> JmmResult<SemanticsResult> {
    if semantics.has_errors() {
        return Err(JmmError::Semantic(semantics.reports));
    }
    Ok(semantics)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = "class Main { public static void main(String[] args) { int a; a = 1; } }";

    #[test]
    fn test_compile_minimal_program() {
        let output = Compiler::default().compile(MINIMAL).unwrap();
        assert_eq!(output.class_name, "Main");
        assert!(output.reports.is_empty());
        assert!(output.ir.contains("a.i32 :=.i32 1.i32;"));
        assert!(output.assembly.contains(".limit locals 2"));
        assert!(output.assembly.contains("istore_1"));
    }

    #[test]
    fn test_semantic_errors_halt_pipeline() {
        let source = "class Main { public static void main(String[] args) { int x; x = true; } }";
        match Compiler::default().compile(source) {
            Err(JmmError::Semantic(reports)) => assert_eq!(reports.len(), 1),
            other => panic!("expected semantic error, got {:?}", other),
        }
        assert!(Compiler::default().generate_ir(source).is_err());
    }

    #[test]
    fn test_analyze_returns_reports_without_failing() {
        let source = "class Main { public static void main(String[] args) { int x; x = true; } }";
        let semantics = Compiler::default().analyze(source).unwrap();
        assert!(semantics.has_errors());
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let err = Compiler::default().compile("class { }").unwrap_err();
        assert!(matches!(err, JmmError::Parser { .. }));
    }

    #[test]
    fn test_compile_to_files() {
        let dir = std::env::temp_dir().join(format!("jmmc-test-{}", std::process::id()));
        let compiler = Compiler::new(Config::new(&dir).with_emit_ir(true));
        let path = compiler.compile_to_files(MINIMAL).unwrap();
        assert_eq!(path, dir.join("Main.j"));
        assert!(std::fs::read_to_string(&path).unwrap().starts_with(".class public Main"));
        assert!(dir.join("Main.ollir").exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
