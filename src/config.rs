//! 编译器配置

use std::path::{Path, PathBuf};

/// 输出相关的编译选项
#[derive(Debug, Clone)]
pub struct Config {
    /// 输出目录，生成的 `.j` / `.ollir` 文件都放在这里
    pub output_dir: PathBuf,
    /// 是否同时写出中间表示
    pub emit_ir: bool,
}

impl Config {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            emit_ir: false,
        }
    }

    pub fn with_emit_ir(mut self, emit_ir: bool) -> Self {
        self.emit_ir = emit_ir;
        self
    }

    /// 根据类名推导输出路径: `<output_dir>/<ClassName>.<ext>`
    pub fn output_path(&self, class_name: &str, ext: &str) -> PathBuf {
        self.output_dir.join(Path::new(class_name).with_extension(ext))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_uses_class_name() {
        let config = Config::new("out");
        assert_eq!(config.output_path("Main", "j"), PathBuf::from("out/Main.j"));
        assert_eq!(config.output_path("Main", "ollir"), PathBuf::from("out/Main.ollir"));
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert!(!config.emit_ir);
    }
}
