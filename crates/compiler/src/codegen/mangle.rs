//! Name mangling.
//!
//! Generic structs/enums/functions mangle as `Base__T0__T1`, where each
//! `Ti` is its argument's canonical short name. A `sN_` suite-test prefix
//! is added when the driver requests internal-linkage test doubles
//! (`CodegenOptions::suite_test_index`), matching own
//! per-suite-test mangling scheme.

use crate::sem::ty::{Type, TypeRef};

/// A short, LLVM-identifier-safe name for one type argument.
pub fn short_type_name(ty: &TypeRef) -> String {
    match ty.as_ref() {
        Type::SInt(w) => format!("I{}", w.bits()),
        Type::UInt(w) => format!("U{}", w.bits()),
        Type::Float(w) => match w {
            crate::sem::ty::FloatWidth::F32 => "F32".to_string(),
            crate::sem::ty::FloatWidth::F64 => "F64".to_string(),
        },
        Type::Bool => "Bool".to_string(),
        Type::Char => "Char".to_string(),
        Type::Str => "Str".to_string(),
        Type::Unit => "Unit".to_string(),
        Type::Never => "Never".to_string(),
        Type::Array(elem, n) => format!("Arr{}_{}", short_type_name(elem), n),
        Type::Slice(elem) => format!("Slice{}", short_type_name(elem)),
        Type::Tuple(elems) => {
            let parts: Vec<String> = elems.iter().map(short_type_name).collect();
            format!("Tup{}", parts.join(""))
        }
        Type::Named { name, args, .. } => {
            if args.is_empty() {
                name.clone()
            } else {
                let parts: Vec<String> = args.iter().map(short_type_name).collect();
                format!("{}__{}", name, parts.join("__"))
            }
        }
        Type::Reference { mutable, inner, .. } => {
            format!("{}Ref{}", if *mutable { "Mut" } else { "" }, short_type_name(inner))
        }
        Type::Pointer { mutable, inner } => {
            format!("{}Ptr{}", if *mutable { "Mut" } else { "" }, short_type_name(inner))
        }
        Type::Function { .. } => "Fn".to_string(),
        Type::Closure { .. } => "Closure".to_string(),
        Type::Generic(name) => name.clone(),
        Type::Var(id) => format!("Var{}", id.0),
        Type::ConstGeneric(name) => name.clone(),
        Type::ConstValue(v, _) => match v {
            crate::sem::ty::ConstValue::Int(i) => format!("{}", i),
            crate::sem::ty::ConstValue::UInt(u) => format!("{}", u),
            crate::sem::ty::ConstValue::Bool(b) => format!("{}", b),
            crate::sem::ty::ConstValue::Char(c) => format!("{}", *c as u32),
        },
        Type::DynBehavior { name, .. } => format!("Dyn{}", name),
        Type::ImplBehavior { name, .. } => format!("Impl{}", name),
    }
}

/// `Base__T0__T1` mangled name for a generic struct/enum/function
/// instantiation. Non-generic definitions mangle to their bare name.
pub fn mangle_generic(base: &str, args: &[TypeRef]) -> String {
    if args.is_empty() {
        return base.to_string();
    }
    let parts: Vec<String> = args.iter().map(short_type_name).collect();
    format!("{}__{}", base, parts.join("__"))
}

/// Prefix applied to every top-level symbol when compiling one of several
/// internal-linkage test doubles of a module in the same binary: each
/// suite gets its own `sN_` prefix so symbols never collide.
pub fn suite_prefix(suite_test_index: Option<u32>) -> String {
    match suite_test_index {
        Some(n) => format!("s{}_", n),
        None => String::new(),
    }
}

/// Escape a source identifier into a valid LLVM IR symbol: TML identifiers
/// are already ASCII-identifier-shaped apart from `::` module separators,
/// which become `_`.
pub fn mangle_path(path: &[String]) -> String {
    path.join("_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sem::ty::IntWidth;
    use std::rc::Rc;

    #[test]
    fn non_generic_mangles_to_bare_name() {
        assert_eq!(mangle_generic("Point", &[]), "Point");
    }

    #[test]
    fn generic_struct_mangles_with_type_args() {
        let args = vec![Rc::new(Type::SInt(IntWidth::W32))];
        assert_eq!(mangle_generic("Box", &args), "Box__I32");
    }

    #[test]
    fn suite_prefix_empty_without_index() {
        assert_eq!(suite_prefix(None), "");
        assert_eq!(suite_prefix(Some(3)), "s3_");
    }
}
