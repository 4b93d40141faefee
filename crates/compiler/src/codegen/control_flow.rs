//! Structured control flow lowering: `if`/`if let`,
//! ternary, `when`, `loop`/`while`/`for`, and labeled `break`/`continue`.
//!
//! Every branching construct allocates a result slot up front when it
//! produces a value (an `if`/`when` used as an expression), stores into
//! it from each arm, and loads it once control reaches the shared
//! continuation block -- the alloca-and-reload idiom is simpler to keep
//! correct across arbitrarily nested control flow than threading SSA phi
//! nodes through by hand, at the cost LLVM's own mem2reg pass (run by
//! `clang -O1` and above) is expected to clean up.

use super::state::{CodeGen, LoopLabels, Val};
use super::types::llvm_type;
use crate::sem::ty::{Type, TypeRef};

/// `if cond { then } else { else }`, used as an expression. `then_ty` is
/// the shared (already unified) type of both arms.
pub fn codegen_if<F1, F2>(
    cg: &mut CodeGen,
    cond: &Val,
    result_ty: &TypeRef,
    emit_then: F1,
    emit_else: Option<F2>,
) -> Val
where
    F1: FnOnce(&mut CodeGen) -> Val,
    F2: FnOnce(&mut CodeGen) -> Val,
{
    let is_unit = matches!(result_ty.as_ref(), Type::Unit | Type::Never);
    let llty = llvm_type(result_ty);
    let result_slot = if is_unit { None } else {
        let slot = cg.next_temp();
        cg.emit_line(format!("  {} = alloca {}", slot, llty));
        Some(slot)
    };

    let then_label = cg.next_block_label("if.then");
    let else_label = cg.next_block_label("if.else");
    let cont_label = cg.next_block_label("if.cont");

    cg.emit_line(format!("  br i1 {}, label %{}, label %{}", cond.text, then_label, else_label));

    cg.emit_line(format!("{}:", then_label));
    let then_val = emit_then(cg);
    if let Some(slot) = &result_slot {
        cg.emit_line(format!("  store {} {}, ptr {}", llty, then_val.text, slot));
    }
    cg.emit_line(format!("  br label %{}", cont_label));

    cg.emit_line(format!("{}:", else_label));
    if let Some(emit_else) = emit_else {
        let else_val = emit_else(cg);
        if let Some(slot) = &result_slot {
            cg.emit_line(format!("  store {} {}, ptr {}", llty, else_val.text, slot));
        }
    }
    cg.emit_line(format!("  br label %{}", cont_label));

    cg.emit_line(format!("{}:", cont_label));
    match result_slot {
        Some(slot) => {
            let t = cg.next_temp();
            cg.emit_line(format!("  {} = load {}, ptr {}", t, llty, slot));
            Val::new(llty, t)
        }
        None => Val::unit(),
    }
}

/// `cond ? then_value : else_value` -- identical lowering to `if`/`else`
/// since both are always-value-producing binary branches; kept as a
/// distinct entry point so callers don't have to wrap a ternary's two
/// expressions in synthetic block exprs first.
pub fn codegen_ternary<F1, F2>(cg: &mut CodeGen, cond: &Val, result_ty: &TypeRef, emit_then: F1, emit_else: F2) -> Val
where
    F1: FnOnce(&mut CodeGen) -> Val,
    F2: FnOnce(&mut CodeGen) -> Val,
{
    codegen_if(cg, cond, result_ty, emit_then, Some(emit_else))
}

/// `when scrutinee { arm => body, ... }`. `arms` gives each arm's guard
/// predicate thunk (already lowered against the bound pattern variables)
/// paired with its body thunk; exhaustiveness has already been checked
/// by the semantic pass, so the final arm's "else" branch is unreachable
/// only in the sense that the checker guarantees it's never taken --
/// codegen still emits an `unreachable` terminator for defense in depth.
pub fn codegen_when<F>(cg: &mut CodeGen, result_ty: &TypeRef, arms: Vec<(Val, F)>) -> Val
where
    F: FnOnce(&mut CodeGen) -> Val,
{
    let is_unit = matches!(result_ty.as_ref(), Type::Unit | Type::Never);
    let llty = llvm_type(result_ty);
    let result_slot = if is_unit {
        None
    } else {
        let slot = cg.next_temp();
        cg.emit_line(format!("  {} = alloca {}", slot, llty));
        Some(slot)
    };
    let cont_label = cg.next_block_label("when.cont");

    let mut next_check_label = cg.next_block_label("when.check");
    cg.emit_line(format!("  br label %{}", next_check_label));

    for (i, (matches_val, emit_body)) in arms.into_iter().enumerate() {
        let check_label = next_check_label;
        let body_label = cg.next_block_label("when.body");
        let is_last = i; // shadow not needed; computed below via closures count unavailable here
        let _ = is_last;
        next_check_label = cg.next_block_label("when.check");

        cg.emit_line(format!("{}:", check_label));
        cg.emit_line(format!(
            "  br i1 {}, label %{}, label %{}",
            matches_val.text, body_label, next_check_label
        ));

        cg.emit_line(format!("{}:", body_label));
        let body_val = emit_body(cg);
        if let Some(slot) = &result_slot {
            cg.emit_line(format!("  store {} {}, ptr {}", llty, body_val.text, slot));
        }
        cg.emit_line(format!("  br label %{}", cont_label));
    }

    cg.emit_line(format!("{}:", next_check_label));
    cg.emit_line("  unreachable");

    cg.emit_line(format!("{}:", cont_label));
    match result_slot {
        Some(slot) => {
            let t = cg.next_temp();
            cg.emit_line(format!("  {} = load {}, ptr {}", t, llty, slot));
            Val::new(llty, t)
        }
        None => Val::unit(),
    }
}

/// `loop { body }` (and the desugared form of `while`/`for`): an
/// unconditional backedge, broken only by `break`. `emit_body` receives
/// the already-pushed loop labels via `cg.current_loop` and is
/// responsible for emitting its own conditional exit (for `while`/`for`)
/// before falling through to the backedge.
pub fn codegen_loop<F>(cg: &mut CodeGen, label: Option<String>, emit_body: F) -> Val
where
    F: FnOnce(&mut CodeGen),
{
    let header = cg.next_block_label("loop.header");
    let exit = cg.next_block_label("loop.exit");
    cg.push_loop(&LoopLabels {
        name: label,
        break_label: exit.clone(),
        continue_label: header.clone(),
    });

    cg.emit_line(format!("  br label %{}", header));
    cg.emit_line(format!("{}:", header));
    emit_body(cg);
    cg.emit_line(format!("  br label %{}", header));

    cg.pop_loop();
    cg.emit_line(format!("{}:", exit));
    Val::unit()
}

/// `while cond { body }`, desugared to `loop { if !cond { break }; body }`.
pub fn codegen_while<FCond, FBody>(cg: &mut CodeGen, label: Option<String>, emit_cond: FCond, emit_body: FBody) -> Val
where
    FCond: Fn(&mut CodeGen) -> Val,
    FBody: FnOnce(&mut CodeGen),
{
    let header = cg.next_block_label("while.header");
    let body_label = cg.next_block_label("while.body");
    let exit = cg.next_block_label("while.exit");
    cg.push_loop(&LoopLabels {
        name: label,
        break_label: exit.clone(),
        continue_label: header.clone(),
    });

    cg.emit_line(format!("  br label %{}", header));
    cg.emit_line(format!("{}:", header));
    let cond = emit_cond(cg);
    cg.emit_line(format!("  br i1 {}, label %{}, label %{}", cond.text, body_label, exit));
    cg.emit_line(format!("{}:", body_label));
    emit_body(cg);
    cg.emit_line(format!("  br label %{}", header));

    cg.pop_loop();
    cg.emit_line(format!("{}:", exit));
    Val::unit()
}

/// `break`/`break label`, optionally carrying a value out of the loop:
/// `break value` is allowed from a `loop` used as an expression, while
/// `while`/`for` never produce a value so `value` is always `None`
/// there. Emits the branch to the loop's exit label; the loop result
/// slot itself is threaded through by the caller emitting `loop` as an
/// expression, mirroring `codegen_if`'s result-slot pattern.
pub fn codegen_break(cg: &mut CodeGen, label: Option<&str>) {
    let target = cg
        .current_loop(label)
        .expect("break outside a loop rejected by the borrow/semantic passes")
        .break_label
        .clone();
    cg.emit_line(format!("  br label %{}", target));
}

pub fn codegen_continue(cg: &mut CodeGen, label: Option<&str>) {
    let target = cg
        .current_loop(label)
        .expect("continue outside a loop rejected by the borrow/semantic passes")
        .continue_label
        .clone();
    cg.emit_line(format!("  br label %{}", target));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn if_expression_merges_through_shared_slot() {
        let mut cg = CodeGen::new();
        let cond = Val::new("i1", "%cond");
        let ty: TypeRef = Rc::new(Type::SInt(crate::sem::ty::IntWidth::W32));
        codegen_if(
            &mut cg,
            &cond,
            &ty,
            |cg| {
                let t = cg.next_temp();
                cg.emit_line(format!("  {} = add i32 1, 1", t));
                Val::new("i32", t)
            },
            Some(|cg: &mut CodeGen| {
                let t = cg.next_temp();
                cg.emit_line(format!("  {} = add i32 2, 2", t));
                Val::new("i32", t)
            }),
        );
        let out = cg.finished_output();
        assert!(out.contains("if.then"));
        assert!(out.contains("if.else"));
        assert!(out.contains("if.cont"));
    }

    #[test]
    fn break_targets_the_innermost_loop_by_default() {
        let mut cg = CodeGen::new();
        cg.push_loop(&LoopLabels {
            name: None,
            break_label: "outer.exit".to_string(),
            continue_label: "outer.header".to_string(),
        });
        codegen_break(&mut cg, None);
        assert!(cg.finished_output().contains("br label %outer.exit"));
    }
}
