//! 操作数栈深度跟踪

use crate::error::{JmmResult, internal_error};

/// 每个方法一个，记录当前深度和最大深度
#[derive(Debug, Default)]
pub struct StackTracker {
    depth: usize,
    max: usize,
}

impl StackTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self) {
        self.push_n(1);
    }

    pub fn push_n(&mut self, count: usize) {
        self.depth += count;
        self.max = self.max.max(self.depth);
    }

    /// 弹出 `count` 个槽位；低于零说明生成器有误
    pub fn pop(&mut self, count: usize) -> JmmResult<()> {
        self.depth = self.depth.checked_sub(count).ok_or_else(|| {
            internal_error(format!(
                "operand stack underflow: popping {} with depth {}",
                count, self.depth
            ))
        })?;
        Ok(())
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// `.limit stack` 的取值
    pub fn max(&self) -> usize {
        self.max
    }
}
