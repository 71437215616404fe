//! Built-in Functions Registry
//!
//! The C standard library functions every program may call without
//! declaring them.

use crate::frontend::ast::Parameter;

/// Built-in function signature
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltinFunc {
    pub name: &'static str,
    pub params: Vec<Parameter>,
    pub ret_type: &'static str,
    /// Whether this function is variadic (like printf)
    pub variadic: bool,
}

impl BuiltinFunc {
    fn new(name: &'static str, ret_type: &'static str, params: &[(&str, &str)]) -> Self {
        Self {
            name,
            params: params
                .iter()
                .map(|(ty, name)| Parameter::new(*ty, *name))
                .collect(),
            ret_type,
            variadic: false,
        }
    }

    fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }
}

/// Standard functions in registration order
pub fn standard_functions() -> Vec<BuiltinFunc> {
    vec![
        // I/O Functions
        BuiltinFunc::new("printf", "int", &[("const char*", "format")]).variadic(),
        BuiltinFunc::new("scanf", "int", &[("const char*", "format")]).variadic(),

        // Memory Functions
        BuiltinFunc::new("malloc", "void*", &[("size_t", "size")]),
        BuiltinFunc::new("free", "void", &[("void*", "ptr")]),

        // String I/O
        BuiltinFunc::new("puts", "int", &[("const char*", "str")]),
        BuiltinFunc::new("gets", "char*", &[("char*", "str")]),
    ]
}
