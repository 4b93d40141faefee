//! C header emission for library builds. Every `pub func` at module top
//! level gets a `tml_<name>(...)` prototype; primitive types map onto the
//! `<stdint.h>`/`<stdbool.h>` equivalents a C caller would expect.

use std::fmt::Write as _;

use crate::ast::decls::{Decl, DeclKind, FuncDecl, Visibility};
use crate::ast::types::{TypeKind, TypeNode};

fn c_type(ty: &TypeNode) -> String {
    match &ty.kind {
        TypeKind::Named { path, generics, .. } => {
            let name = path.last().cloned().unwrap_or_default();
            match name.as_str() {
                "I8" => "int8_t".to_string(),
                "I16" => "int16_t".to_string(),
                "I32" => "int32_t".to_string(),
                "I64" => "int64_t".to_string(),
                "I128" => "__int128".to_string(),
                "U8" => "uint8_t".to_string(),
                "U16" => "uint16_t".to_string(),
                "U32" => "uint32_t".to_string(),
                "U64" => "uint64_t".to_string(),
                "U128" => "unsigned __int128".to_string(),
                "F32" => "float".to_string(),
                "F64" => "double".to_string(),
                "Bool" => "bool".to_string(),
                "Char" => "uint32_t".to_string(),
                "Str" => "const char*".to_string(),
                "Unit" => "void".to_string(),
                _ if !generics.is_empty() => "void*".to_string(),
                _ => format!("struct tml_{}*", name),
            }
        }
        TypeKind::Reference { mutable, inner, .. } | TypeKind::Pointer { mutable, inner } => {
            if *mutable {
                format!("{}*", c_type(inner))
            } else {
                format!("const {}*", c_type(inner))
            }
        }
        TypeKind::Slice { .. } | TypeKind::FixedArray { .. } => "void*".to_string(),
        TypeKind::Tuple { .. } => "void*".to_string(),
        TypeKind::FuncSig { .. } => "void*".to_string(),
        TypeKind::DynBehavior { .. } | TypeKind::ImplBehavior { .. } => "void*".to_string(),
        TypeKind::Infer | TypeKind::TemplateText => "void*".to_string(),
    }
}

fn emit_func_prototype(out: &mut String, f: &FuncDecl) {
    let ret = f.sig.ret.as_ref().map(c_type).unwrap_or_else(|| "void".to_string());
    let params: Vec<String> = f
        .sig
        .params
        .iter()
        .map(|p| format!("{} {}", c_type(&p.ty), p.name))
        .collect();
    let _ = writeln!(out, "{} tml_{}({});", ret, f.sig.name, params.join(", "));
}

fn walk_decls(out: &mut String, decls: &[Decl]) {
    for decl in decls {
        match &decl.kind {
            DeclKind::Func(f) if matches!(f.visibility, Visibility::Public) => {
                emit_func_prototype(out, f);
            }
            DeclKind::Mod(m) => {
                if let Some(items) = &m.items {
                    walk_decls(out, items);
                }
            }
            _ => {}
        }
    }
}

/// Build a complete C11 header for a module's public surface: include
/// guards, `<stdint.h>`/`<stdbool.h>`, and an `extern "C"` block.
pub fn generate_c_header(module_name: &str, decls: &[Decl]) -> String {
    let guard = format!("TML_{}_H", module_name.to_uppercase());
    let mut out = String::new();
    let _ = writeln!(out, "#ifndef {}", guard);
    let _ = writeln!(out, "#define {}\n", guard);
    let _ = writeln!(out, "#include <stdint.h>");
    let _ = writeln!(out, "#include <stdbool.h>\n");
    let _ = writeln!(out, "#ifdef __cplusplus");
    let _ = writeln!(out, "extern \"C\" {{");
    let _ = writeln!(out, "#endif\n");

    walk_decls(&mut out, decls);

    let _ = writeln!(out, "\n#ifdef __cplusplus");
    let _ = writeln!(out, "}}");
    let _ = writeln!(out, "#endif\n");
    let _ = writeln!(out, "#endif /* {} */", guard);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::decls::{FuncParam, FuncSignature};
    use crate::source::{Loc, Span};

    fn dummy_span() -> Span {
        Span { start: Loc { byte: 0 }, end: Loc { byte: 0 } }
    }

    #[test]
    fn header_has_include_guard_and_extern_c() {
        let out = generate_c_header("mylib", &[]);
        assert!(out.contains("#ifndef TML_MYLIB_H"));
        assert!(out.contains("extern \"C\""));
        assert!(out.contains("stdint.h"));
    }

    #[test]
    fn public_function_gets_a_prototype() {
        let f = FuncDecl {
            sig: FuncSignature {
                name: "add".to_string(),
                generics: vec![],
                const_generics: vec![],
                params: vec![FuncParam {
                    name: "a".to_string(),
                    ty: TypeNode::new(
                        TypeKind::Named { path: vec!["I32".to_string()], generics: vec![], const_args: vec![] },
                        dummy_span(),
                    ),
                    span: dummy_span(),
                }],
                ret: Some(TypeNode::new(
                    TypeKind::Named { path: vec!["I32".to_string()], generics: vec![], const_args: vec![] },
                    dummy_span(),
                )),
                where_clauses: vec![],
                is_async: false,
                is_lowlevel: false,
            },
            body: None,
            visibility: Visibility::Public,
            decorators: vec![],
            span: dummy_span(),
        };
        let decl = Decl::new(DeclKind::Func(f), dummy_span());
        let out = generate_c_header("mylib", &[decl]);
        assert!(out.contains("int32_t tml_add(int32_t a);"));
    }
}
