//! Floating-point math intrinsics, lowered directly to LLVM's own
//! `llvm.*` intrinsic declarations rather than a runtime call: LLVM
//! already provides these as target-independent intrinsics, so emitting
//! a call to `@llvm.sqrt.f64` needs no hand-written runtime
//! implementation.

use super::super::state::{CodeGen, Val};

const UNARY: &[(&str, &str)] = &[
    ("sqrt", "llvm.sqrt.f64"),
    ("abs_f64", "llvm.fabs.f64"),
    ("floor", "llvm.floor.f64"),
    ("ceil", "llvm.ceil.f64"),
    ("sin", "llvm.sin.f64"),
    ("cos", "llvm.cos.f64"),
    ("log", "llvm.log.f64"),
    ("exp", "llvm.exp.f64"),
];

const BINARY: &[(&str, &str)] = &[("pow", "llvm.pow.f64"), ("min_f64", "llvm.minnum.f64"), ("max_f64", "llvm.maxnum.f64")];

pub fn try_gen(cg: &mut CodeGen, name: &str, args: &[Val]) -> Option<Val> {
    if let Some((_, intrinsic)) = UNARY.iter().find(|(n, _)| *n == name) {
        cg.mark_needed(intrinsic.to_string());
        let t = cg.next_temp();
        cg.emit_line(format!("  {} = call double @{}(double {})", t, intrinsic, args.first()?.text));
        return Some(Val::new("double", t));
    }
    if let Some((_, intrinsic)) = BINARY.iter().find(|(n, _)| *n == name) {
        cg.mark_needed(intrinsic.to_string());
        let t = cg.next_temp();
        cg.emit_line(format!(
            "  {} = call double @{}(double {}, double {})",
            t, intrinsic, args[0].text, args[1].text
        ));
        return Some(Val::new("double", t));
    }
    None
}
