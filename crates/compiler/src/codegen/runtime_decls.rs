//! The runtime function catalogue and its dead-stripping.
//!
//! Every external symbol the generated IR might call is declared here
//! with its canonical signature. `emit_runtime_decls` only writes the
//! declarations actually marked "needed" by [`super::state::CodeGen`]
//! during generation, so the emitted preamble carries no unused
//! `declare`s.

use std::fmt::Write as _;

/// One runtime/FFI symbol's declaration text, keyed by its TML-visible
/// name (the name the type checker's FFI intrinsic table in
/// `sem::builtins` uses).
pub struct RuntimeSymbol {
    pub name: &'static str,
    pub decl: &'static str,
}

pub const RUNTIME_SYMBOLS: &[RuntimeSymbol] = &[
    // I/O
    RuntimeSymbol { name: "print", decl: "declare void @print(ptr)" },
    RuntimeSymbol { name: "println", decl: "declare void @println(ptr)" },
    RuntimeSymbol { name: "print_i32", decl: "declare void @print_i32(i32)" },
    RuntimeSymbol { name: "print_i64", decl: "declare void @print_i64(i64)" },
    RuntimeSymbol { name: "print_f64", decl: "declare void @print_f64(double)" },
    RuntimeSymbol { name: "print_bool", decl: "declare void @print_bool(i32)" },
    RuntimeSymbol { name: "panic", decl: "declare void @panic(ptr)" },
    // Memory
    RuntimeSymbol { name: "malloc", decl: "declare ptr @malloc(i64)" },
    RuntimeSymbol { name: "free", decl: "declare void @free(ptr)" },
    RuntimeSymbol { name: "mem_alloc", decl: "declare ptr @mem_alloc(i64)" },
    RuntimeSymbol { name: "mem_free", decl: "declare void @mem_free(ptr)" },
    RuntimeSymbol { name: "mem_copy", decl: "declare void @mem_copy(ptr, ptr, i64)" },
    RuntimeSymbol { name: "mem_move", decl: "declare void @mem_move(ptr, ptr, i64)" },
    RuntimeSymbol { name: "mem_set", decl: "declare void @mem_set(ptr, i8, i64)" },
    RuntimeSymbol { name: "mem_zero", decl: "declare void @mem_zero(ptr, i64)" },
    RuntimeSymbol { name: "mem_compare", decl: "declare i32 @mem_compare(ptr, ptr, i64)" },
    RuntimeSymbol { name: "mem_eq", decl: "declare i1 @mem_eq(ptr, ptr, i64)" },
    RuntimeSymbol { name: "mem_realloc", decl: "declare ptr @mem_realloc(ptr, i64)" },
    // Atomics
    RuntimeSymbol { name: "atomic_fetch_add_i32", decl: "declare i32 @atomic_fetch_add_i32(ptr, i32)" },
    RuntimeSymbol { name: "atomic_fetch_sub_i32", decl: "declare i32 @atomic_fetch_sub_i32(ptr, i32)" },
    RuntimeSymbol { name: "atomic_load_i32", decl: "declare i32 @atomic_load_i32(ptr)" },
    RuntimeSymbol { name: "atomic_store_i32", decl: "declare void @atomic_store_i32(ptr, i32)" },
    RuntimeSymbol { name: "atomic_compare_exchange_i32", decl: "declare i1 @atomic_compare_exchange_i32(ptr, ptr, i32)" },
    RuntimeSymbol { name: "atomic_swap_i32", decl: "declare i32 @atomic_swap_i32(ptr, i32)" },
    RuntimeSymbol { name: "atomic_fetch_add_i64", decl: "declare i64 @atomic_fetch_add_i64(ptr, i64)" },
    RuntimeSymbol { name: "atomic_fetch_sub_i64", decl: "declare i64 @atomic_fetch_sub_i64(ptr, i64)" },
    RuntimeSymbol { name: "atomic_load_i64", decl: "declare i64 @atomic_load_i64(ptr)" },
    RuntimeSymbol { name: "atomic_store_i64", decl: "declare void @atomic_store_i64(ptr, i64)" },
    RuntimeSymbol { name: "atomic_compare_exchange_i64", decl: "declare i1 @atomic_compare_exchange_i64(ptr, ptr, i64)" },
    RuntimeSymbol { name: "atomic_swap_i64", decl: "declare i64 @atomic_swap_i64(ptr, i64)" },
    RuntimeSymbol { name: "atomic_fence", decl: "declare void @atomic_fence()" },
    RuntimeSymbol { name: "atomic_fence_acquire", decl: "declare void @atomic_fence_acquire()" },
    RuntimeSymbol { name: "atomic_fence_release", decl: "declare void @atomic_fence_release()" },
    // Polling
    RuntimeSymbol { name: "tml_poll_create", decl: "declare ptr @tml_poll_create()" },
    RuntimeSymbol { name: "tml_poll_destroy", decl: "declare void @tml_poll_destroy(ptr)" },
    RuntimeSymbol { name: "tml_poll_add", decl: "declare i32 @tml_poll_add(ptr, i32, i32)" },
    RuntimeSymbol { name: "tml_poll_modify", decl: "declare i32 @tml_poll_modify(ptr, i32, i32)" },
    RuntimeSymbol { name: "tml_poll_remove", decl: "declare i32 @tml_poll_remove(ptr, i32)" },
    RuntimeSymbol { name: "tml_poll_wait", decl: "declare i32 @tml_poll_wait(ptr, ptr, i32, i32)" },
    // Concurrency
    RuntimeSymbol { name: "thread_spawn", decl: "declare ptr @thread_spawn(ptr, ptr)" },
    RuntimeSymbol { name: "thread_join", decl: "declare void @thread_join(ptr)" },
    RuntimeSymbol { name: "thread_yield", decl: "declare void @thread_yield()" },
    RuntimeSymbol { name: "thread_sleep", decl: "declare void @thread_sleep(i64)" },
    RuntimeSymbol { name: "thread_id", decl: "declare i64 @thread_id()" },
    RuntimeSymbol { name: "channel_create", decl: "declare ptr @channel_create(i64)" },
    RuntimeSymbol { name: "channel_send", decl: "declare void @channel_send(ptr, ptr)" },
    RuntimeSymbol { name: "channel_recv", decl: "declare ptr @channel_recv(ptr)" },
    RuntimeSymbol { name: "channel_try_recv", decl: "declare ptr @channel_try_recv(ptr)" },
    RuntimeSymbol { name: "channel_close", decl: "declare void @channel_close(ptr)" },
    RuntimeSymbol { name: "mutex_create", decl: "declare ptr @mutex_create()" },
    RuntimeSymbol { name: "mutex_lock", decl: "declare void @mutex_lock(ptr)" },
    RuntimeSymbol { name: "mutex_unlock", decl: "declare void @mutex_unlock(ptr)" },
    RuntimeSymbol { name: "mutex_trylock", decl: "declare i1 @mutex_trylock(ptr)" },
    RuntimeSymbol { name: "waitgroup_create", decl: "declare ptr @waitgroup_create()" },
    RuntimeSymbol { name: "waitgroup_add", decl: "declare void @waitgroup_add(ptr, i32)" },
    RuntimeSymbol { name: "waitgroup_done", decl: "declare void @waitgroup_done(ptr)" },
    RuntimeSymbol { name: "waitgroup_wait", decl: "declare void @waitgroup_wait(ptr)" },
    RuntimeSymbol { name: "spin_lock", decl: "declare void @spin_lock(ptr)" },
    RuntimeSymbol { name: "spin_unlock", decl: "declare void @spin_unlock(ptr)" },
    RuntimeSymbol { name: "spin_trylock", decl: "declare i1 @spin_trylock(ptr)" },
    // Coverage
    RuntimeSymbol { name: "tml_cover_func", decl: "declare void @tml_cover_func(ptr)" },
    RuntimeSymbol { name: "tml_cover_line", decl: "declare void @tml_cover_line(ptr, i32)" },
    RuntimeSymbol { name: "tml_cover_branch", decl: "declare void @tml_cover_branch(ptr, i32, i32)" },
    RuntimeSymbol { name: "tml_cover_report", decl: "declare void @tml_cover_report()" },
    // String helpers (backing `Str` concat/interp/format)
    RuntimeSymbol { name: "str_concat", decl: "declare ptr @str_concat(ptr, ptr)" },
    RuntimeSymbol { name: "str_from_i64", decl: "declare ptr @str_from_i64(i64)" },
    RuntimeSymbol { name: "str_from_f64", decl: "declare ptr @str_from_f64(double)" },
    RuntimeSymbol { name: "str_from_bool", decl: "declare ptr @str_from_bool(i1)" },
    RuntimeSymbol { name: "str_len", decl: "declare i64 @str_len(ptr)" },
    RuntimeSymbol { name: "str_eq", decl: "declare i1 @str_eq(ptr, ptr)" },
    RuntimeSymbol { name: "str_hash", decl: "declare i64 @str_hash(ptr)" },
];

pub fn lookup(name: &str) -> Option<&'static RuntimeSymbol> {
    RUNTIME_SYMBOLS.iter().find(|s| s.name == name)
}

/// Emit only the declarations whose symbol name is in `needed`, in the
/// catalogue's own (stable) order, so output is deterministic across runs
///.
pub fn emit_runtime_decls(out: &mut String, needed: &std::collections::HashSet<String>) -> std::fmt::Result {
    if needed.is_empty() {
        return Ok(());
    }
    writeln!(out, "; Runtime function declarations")?;
    for sym in RUNTIME_SYMBOLS {
        if needed.contains(sym.name) {
            writeln!(out, "{}", sym.decl)?;
        }
    }
    // LLVM intrinsics used by `codegen::builtins::math` aren't part of
    // the hand-maintained runtime catalogue above (LLVM, not our own
    // runtime, defines their semantics) -- synthesize their declare line
    // from the well-known unary/binary-double shape every math intrinsic
    // we call uses.
    let mut llvm_names: Vec<&String> = needed.iter().filter(|n| n.starts_with("llvm.")).collect();
    llvm_names.sort();
    for name in llvm_names {
        if name == "llvm.pow.f64" || name == "llvm.minnum.f64" || name == "llvm.maxnum.f64" {
            writeln!(out, "declare double @{}(double, double)", name)?;
        } else {
            writeln!(out, "declare double @{}(double)", name)?;
        }
    }
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_finds_known_symbol() {
        assert!(lookup("println").is_some());
        assert!(lookup("not_a_real_symbol").is_none());
    }

    #[test]
    fn emit_only_writes_needed_decls() {
        let mut needed = std::collections::HashSet::new();
        needed.insert("println".to_string());
        let mut out = String::new();
        emit_runtime_decls(&mut out, &needed).unwrap();
        assert!(out.contains("@println"));
        assert!(!out.contains("@malloc"));
    }
}
