use std::fmt;

pub const INT: &str = "int";
pub const BOOLEAN: &str = "boolean";
pub const VOID: &str = "void";
pub const STRING: &str = "String";
/// main 方法在符号表中登记的固定返回类型
pub const STATIC_VOID: &str = "static void";

/// 源语言中的值类型：名字加数组标记，相等即名字与数组标记都相同
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Type {
    pub name: String,
    pub is_array: bool,
}

/// 带类型的名字（字段、参数、局部变量）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub ty: Type,
}

impl Type {
    pub fn new(name: impl Into<String>, is_array: bool) -> Self {
        Self {
            name: name.into(),
            is_array,
        }
    }

    pub fn int() -> Self {
        Self::new(INT, false)
    }

    pub fn int_array() -> Self {
        Self::new(INT, true)
    }

    pub fn boolean() -> Self {
        Self::new(BOOLEAN, false)
    }

    pub fn void() -> Self {
        Self::new(VOID, false)
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, false)
    }

    pub fn is_int(&self) -> bool {
        self.name == INT && !self.is_array
    }

    pub fn is_boolean(&self) -> bool {
        self.name == BOOLEAN && !self.is_array
    }

    pub fn is_void(&self) -> bool {
        self.name == VOID
    }

    /// 基本类型按名字判断，与数组标记无关
    pub fn is_primitive(&self) -> bool {
        matches!(self.name.as_str(), INT | BOOLEAN | VOID)
    }

    /// 数组的元素类型；非数组原样返回
    pub fn element(&self) -> Type {
        Self::new(self.name.clone(), false)
    }

    pub fn array_of(&self) -> Type {
        Self::new(self.name.clone(), true)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_array {
            write!(f, "{}[]", self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

impl Symbol {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_equality_includes_array_flag() {
        assert_eq!(Type::int(), Type::new("int", false));
        assert_ne!(Type::int(), Type::int_array());
        assert_ne!(Type::class("Foo"), Type::class("Bar"));
    }

    #[test]
    fn test_type_display() {
        assert_eq!(Type::int_array().to_string(), "int[]");
        assert_eq!(Type::boolean().to_string(), "boolean");
        assert_eq!(Symbol::new("a", Type::int()).to_string(), "a: int");
    }

    #[test]
    fn test_primitive_and_element() {
        assert!(Type::int_array().is_primitive());
        assert!(!Type::class("Foo").is_primitive());
        assert_eq!(Type::int_array().element(), Type::int());
        assert_eq!(Type::int().array_of(), Type::int_array());
    }
}
