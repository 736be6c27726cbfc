//! 源语言类型到 IR 类型后缀的转换

use crate::types::{Symbol, Type, BOOLEAN, INT, STATIC_VOID, VOID};

/// `int` → `i32`，`boolean` → `bool`，`void` → `V`，数组加 `array.` 前缀
pub fn type_to_ir(ty: &Type) -> String {
    let element = match ty.name.as_str() {
        INT => "i32",
        BOOLEAN => "bool",
        VOID | STATIC_VOID => "V",
        other => other,
    };
    if ty.is_array {
        format!("array.{}", element)
    } else {
        element.to_string()
    }
}

/// `name.type`
pub fn symbol_to_ir(symbol: &Symbol) -> String {
    format!("{}.{}", symbol.name, type_to_ir(&symbol.ty))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_suffixes() {
        assert_eq!(type_to_ir(&Type::int()), "i32");
        assert_eq!(type_to_ir(&Type::int_array()), "array.i32");
        assert_eq!(type_to_ir(&Type::boolean()), "bool");
        assert_eq!(type_to_ir(&Type::void()), "V");
        assert_eq!(type_to_ir(&Type::new("String", true)), "array.String");
        assert_eq!(type_to_ir(&Type::class("Foo")), "Foo");
        assert_eq!(symbol_to_ir(&Symbol::new("a", Type::int())), "a.i32");
    }
}
