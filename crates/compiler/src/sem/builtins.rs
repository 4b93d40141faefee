//! Builtins installed once into a fresh [`super::env::TypeEnv`]: primitive
//! name bindings, the closed `Ordering`/`Maybe`/`Outcome`/`Poll` enums, the
//! `Future`/`Drop` behaviors, the per-primitive default-behavior table, and
//! the FFI/runtime intrinsic signature catalogue.

use std::rc::Rc;

use super::env::TypeEnv;
use super::ty::{FloatWidth, IntWidth, Type, TypeRef};

fn named(name: &str, args: Vec<TypeRef>) -> TypeRef {
    Rc::new(Type::Named {
        name: name.to_string(),
        module_path: vec![],
        args,
    })
}

/// A builtin free-function overload set's signature shape (used for
/// `assert_eq`-style per-primitive entries and the FFI/runtime intrinsic
/// catalogue). Codegen consults the same table to know which names are
/// direct runtime calls.
#[derive(Debug, Clone)]
pub struct BuiltinSignature {
    pub params: Vec<TypeRef>,
    pub ret: TypeRef,
    /// `true` for FFI/runtime intrinsics that lower to a named external
    /// call rather than to inline IR the checker itself shapes.
    pub is_ffi: bool,
}

pub fn install_builtins(env: &mut TypeEnv) {
    install_primitive_names(env);
    install_closed_enums(env);
    install_default_behavior_table(env);
    install_free_functions(env);
    install_ffi_intrinsics(env);
}

fn install_primitive_names(env: &mut TypeEnv) {
    let ints = [
        ("I8", IntWidth::W8, true),
        ("I16", IntWidth::W16, true),
        ("I32", IntWidth::W32, true),
        ("I64", IntWidth::W64, true),
        ("I128", IntWidth::W128, true),
        ("U8", IntWidth::W8, false),
        ("U16", IntWidth::W16, false),
        ("U32", IntWidth::W32, false),
        ("U64", IntWidth::W64, false),
        ("U128", IntWidth::W128, false),
    ];
    for (name, width, signed) in ints {
        let ty = if signed {
            Type::SInt(width)
        } else {
            Type::UInt(width)
        };
        env.builtins.insert(name.to_string(), Rc::new(ty));
    }
    env.builtins
        .insert("F32".to_string(), Rc::new(Type::Float(FloatWidth::F32)));
    env.builtins
        .insert("F64".to_string(), Rc::new(Type::Float(FloatWidth::F64)));
    env.builtins.insert("Bool".to_string(), Rc::new(Type::Bool));
    env.builtins.insert("Char".to_string(), Rc::new(Type::Char));
    env.builtins.insert("Str".to_string(), Rc::new(Type::Str));
    env.builtins.insert("Unit".to_string(), Rc::new(Type::Unit));
    env.builtins
        .insert("Never".to_string(), Rc::new(Type::Never));
}

/// `Ordering{Less,Equal,Greater}`, `Maybe[T]{Just(T),Nothing}`,
/// `Outcome[T,E]{Ok(T),Err(E)}`, `Poll[T]{Ready(T),Pending}`. These are
/// registered as zero-field `Named` markers here; their variant shape
/// lives in `crate::sem::check::bodies` pattern-binding logic and in
/// codegen's enum layout, both of which special-case these four names.
fn install_closed_enums(env: &mut TypeEnv) {
    env.builtins
        .insert("Ordering".to_string(), named("Ordering", vec![]));
    let t = env.fresh_type_var();
    env.builtins.insert("Maybe".to_string(), named("Maybe", vec![t]));
    let (t, e) = (env.fresh_type_var(), env.fresh_type_var());
    env.builtins
        .insert("Outcome".to_string(), named("Outcome", vec![t, e]));
    let t = env.fresh_type_var();
    env.builtins.insert("Poll".to_string(), named("Poll", vec![t]));
}

/// `Future{ type Output; poll(this) -> Poll[This.Output] }` and
/// `Drop{ drop(mut this) }` are registered as behavior *names* here; the
/// checker's behavior-impl table (`TypeEnv::behavior_impls`) is populated
/// per concrete type as impls are seen in the declaration pass. All
/// integers/floats get `Eq/Ord/Numeric/Hash/Display/Debug/Default/Duplicate`
/// (floats without `Hash`), installed below as the default table.
fn install_default_behavior_table(env: &mut TypeEnv) {
    let int_behaviors = [
        "Eq", "Ord", "Numeric", "Hash", "Display", "Debug", "Default", "Duplicate", "Copy",
    ];
    for name in ["I8", "I16", "I32", "I64", "I128", "U8", "U16", "U32", "U64", "U128"] {
        for b in int_behaviors {
            env.register_impl(name, b);
        }
    }
    let float_behaviors = ["Eq", "Ord", "Numeric", "Display", "Debug", "Default", "Duplicate", "Copy"];
    for name in ["F32", "F64"] {
        for b in float_behaviors {
            env.register_impl(name, b);
        }
    }
    for b in ["Eq", "Display", "Debug", "Default", "Duplicate", "Copy"] {
        env.register_impl("Bool", b);
        env.register_impl("Char", b);
    }
    env.register_impl("Str", "Eq");
    env.register_impl("Str", "Ord");
    env.register_impl("Str", "Display");
    env.register_impl("Str", "Debug");
    env.register_impl("Str", "Hash");
}

/// Builtin free functions registered with explicit per-primitive overload
/// entries, e.g. `assert_eq` has one signature per primitive pair. Stored
/// on `TypeEnv::builtins` under a distinguishing key so the
/// declaration-registration pass (`sem::check::decls`) can seed the
/// function-overload table without re-deriving this list.
fn install_free_functions(env: &mut TypeEnv) {
    let prims: Vec<TypeRef> = [
        "I8", "I16", "I32", "I64", "I128", "U8", "U16", "U32", "U64", "U128", "F32", "F64",
        "Bool", "Char", "Str",
    ]
    .iter()
    .map(|n| env.builtins[*n].clone())
    .collect();
    for p in &prims {
        env.builtins.insert(
            format!("__free_fn::assert_eq::{}", p),
            Rc::new(Type::Function {
                params: vec![p.clone(), p.clone()],
                ret: Type::unit(),
            }),
        );
        env.builtins.insert(
            format!("__free_fn::assert::{}", p),
            Rc::new(Type::Function {
                params: vec![env.builtins["Bool"].clone()],
                ret: Type::unit(),
            }),
        );
    }
}

/// FFI/runtime intrinsics: registered as FFI-style
/// signatures so the type checker accepts calls to them; codegen emits
/// direct external calls per `codegen::runtime_decls`.
fn install_ffi_intrinsics(env: &mut TypeEnv) {
    let ptr = || {
        Rc::new(Type::Pointer {
            mutable: true,
            inner: Type::unit(),
        })
    };
    let i32_t = env.builtins["I32"].clone();
    let i64_t = env.builtins["I64"].clone();
    let unit = Type::unit();

    let sigs: &[(&str, Vec<TypeRef>, TypeRef)] = &[
        ("mem_alloc", vec![i64_t.clone()], ptr()),
        ("mem_free", vec![ptr()], unit.clone()),
        (
            "mem_copy",
            vec![ptr(), ptr(), i64_t.clone()],
            unit.clone(),
        ),
        (
            "mem_move",
            vec![ptr(), ptr(), i64_t.clone()],
            unit.clone(),
        ),
        (
            "mem_set",
            vec![ptr(), i32_t.clone(), i64_t.clone()],
            unit.clone(),
        ),
        ("mem_zero", vec![ptr(), i64_t.clone()], unit.clone()),
        (
            "mem_compare",
            vec![ptr(), ptr(), i64_t.clone()],
            i32_t.clone(),
        ),
        ("mem_eq", vec![ptr(), ptr(), i64_t.clone()], env.builtins["Bool"].clone()),
        (
            "mem_realloc",
            vec![ptr(), i64_t.clone()],
            ptr(),
        ),
        ("atomic_fetch_add_i32", vec![ptr(), i32_t.clone()], i32_t.clone()),
        ("atomic_fetch_sub_i32", vec![ptr(), i32_t.clone()], i32_t.clone()),
        ("atomic_load_i32", vec![ptr()], i32_t.clone()),
        ("atomic_store_i32", vec![ptr(), i32_t.clone()], unit.clone()),
        (
            "atomic_compare_exchange_i32",
            vec![ptr(), i32_t.clone(), i32_t.clone()],
            env.builtins["Bool"].clone(),
        ),
        ("atomic_fetch_add_i64", vec![ptr(), i64_t.clone()], i64_t.clone()),
        ("atomic_load_i64", vec![ptr()], i64_t.clone()),
        ("atomic_store_i64", vec![ptr(), i64_t.clone()], unit.clone()),
        ("atomic_fence", vec![], unit.clone()),
        ("atomic_fence_acquire", vec![], unit.clone()),
        ("atomic_fence_release", vec![], unit.clone()),
        ("thread_spawn", vec![ptr(), ptr()], i64_t.clone()),
        ("thread_join", vec![i64_t.clone()], unit.clone()),
        ("thread_yield", vec![], unit.clone()),
        ("thread_sleep", vec![i64_t.clone()], unit.clone()),
        ("thread_id", vec![], i64_t.clone()),
        ("channel_create", vec![i64_t.clone()], ptr()),
        ("channel_send", vec![ptr(), ptr()], unit.clone()),
        ("channel_recv", vec![ptr()], ptr()),
        ("mutex_create", vec![], ptr()),
        ("mutex_lock", vec![ptr()], unit.clone()),
        ("mutex_unlock", vec![ptr()], unit.clone()),
        ("mutex_trylock", vec![ptr()], env.builtins["Bool"].clone()),
        ("waitgroup_create", vec![], ptr()),
        ("waitgroup_add", vec![ptr(), i32_t.clone()], unit.clone()),
        ("waitgroup_done", vec![ptr()], unit.clone()),
        ("waitgroup_wait", vec![ptr()], unit.clone()),
        ("spin_lock", vec![ptr()], unit.clone()),
        ("spin_unlock", vec![ptr()], unit.clone()),
        ("spin_trylock", vec![ptr()], env.builtins["Bool"].clone()),
        ("tml_poll_create", vec![], i32_t.clone()),
        ("tml_poll_destroy", vec![i32_t.clone()], unit.clone()),
        (
            "tml_poll_add",
            vec![i32_t.clone(), i32_t.clone(), i32_t.clone()],
            i32_t.clone(),
        ),
        (
            "tml_poll_wait",
            vec![i32_t.clone(), ptr(), i32_t.clone()],
            i32_t.clone(),
        ),
        ("print", vec![Rc::new(Type::Str)], unit.clone()),
        ("println", vec![Rc::new(Type::Str)], unit.clone()),
        ("print_i32", vec![i32_t.clone()], unit.clone()),
        ("print_i64", vec![i64_t.clone()], unit.clone()),
        (
            "print_f64",
            vec![env.builtins["F64"].clone()],
            unit.clone(),
        ),
        (
            "print_bool",
            vec![env.builtins["Bool"].clone()],
            unit.clone(),
        ),
        ("panic", vec![Rc::new(Type::Str)], Type::never()),
    ];
    for (name, params, ret) in sigs {
        env.builtins.insert(
            format!("__ffi::{}", name),
            Rc::new(Type::Function {
                params: params.clone(),
                ret: ret.clone(),
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sem::module::ModuleRegistry;

    #[test]
    fn installs_primitive_names() {
        let env = TypeEnv::new(ModuleRegistry::new());
        assert_eq!(env.builtins["I32"].as_ref(), &Type::SInt(IntWidth::W32));
        assert_eq!(env.builtins["F64"].as_ref(), &Type::Float(FloatWidth::F64));
    }

    #[test]
    fn integers_implement_default_table() {
        let env = TypeEnv::new(ModuleRegistry::new());
        assert!(env.implements("I32", "Eq"));
        assert!(env.implements("I32", "Hash"));
        assert!(!env.implements("F32", "Hash"));
    }

    #[test]
    fn ffi_intrinsics_registered() {
        let env = TypeEnv::new(ModuleRegistry::new());
        assert!(env.builtins.contains_key("__ffi::mem_alloc"));
        assert!(env.builtins.contains_key("__ffi::channel_send"));
    }
}
