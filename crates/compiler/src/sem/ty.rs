//! Semantic types — distinct from the AST's [`crate::ast::types::TypeNode`].
//!
//! Shared by `Rc` so that passing a type around the checker is a pointer
//! bump, not a clone of a recursive structure. Primitive identity is by
//! `kind` only; compound types compare structurally, which
//! falls out of `Type`'s derived `PartialEq` since `Rc<Type>` compares its
//! pointee.

use std::fmt;
use std::rc::Rc;

pub type TypeRef = Rc<Type>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
    W128,
}

impl IntWidth {
    pub fn bits(self) -> u32 {
        match self {
            IntWidth::W8 => 8,
            IntWidth::W16 => 16,
            IntWidth::W32 => 32,
            IntWidth::W64 => 64,
            IntWidth::W128 => 128,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatWidth {
    F32,
    F64,
}

/// A fresh unification variable, produced only by [`super::env::TypeEnv`].
/// Resolution is idempotent once bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeVarId(pub u32);

/// A fresh lifetime id, minted per borrow by the borrow checker; the
/// checker only ever records an explicit *name* here (`ref[a] T`), leaving
/// the numeric id assignment to `crate::borrow`.
pub type LifetimeId = Option<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstValue {
    Int(i128),
    UInt(u128),
    Bool(bool),
    Char(char),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    // Primitives
    SInt(IntWidth),
    UInt(IntWidth),
    Float(FloatWidth),
    Bool,
    Char,
    Str,
    Unit,
    Never,

    // Compound
    Array(TypeRef, u64),
    Slice(TypeRef),
    Tuple(Vec<TypeRef>),
    Function {
        params: Vec<TypeRef>,
        ret: TypeRef,
    },
    Closure {
        params: Vec<TypeRef>,
        ret: TypeRef,
        captures: Vec<(String, TypeRef)>,
    },

    // User-defined
    Named {
        name: String,
        module_path: Vec<String>,
        args: Vec<TypeRef>,
    },

    // References / pointers
    Reference {
        mutable: bool,
        lifetime: LifetimeId,
        inner: TypeRef,
    },
    Pointer {
        mutable: bool,
        inner: TypeRef,
    },

    // Generics and inference
    Generic(String),
    Var(TypeVarId),
    ConstGeneric(String),
    ConstValue(ConstValue, TypeRef),

    // Behavior objects
    DynBehavior {
        name: String,
        args: Vec<TypeRef>,
        mutable: bool,
    },
    ImplBehavior {
        name: String,
        args: Vec<TypeRef>,
    },
}

impl Type {
    pub fn is_integer(&self) -> bool {
        matches!(self, Type::SInt(_) | Type::UInt(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Type::Float(_))
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// Copy types: primitives, raw pointers, references, `Unit`.
    /// Everything else requires an explicit move or `.duplicate()`.
    pub fn is_copy(&self) -> bool {
        match self {
            Type::SInt(_)
            | Type::UInt(_)
            | Type::Float(_)
            | Type::Bool
            | Type::Char
            | Type::Unit
            | Type::Pointer { .. }
            | Type::Reference { .. } => true,
            Type::Tuple(elems) => elems.iter().all(|t| t.is_copy()),
            Type::ConstValue(_, _) => true,
            _ => false,
        }
    }

    pub fn name_or(&self, fallback: &str) -> String {
        match self {
            Type::Named { name, .. } => name.clone(),
            _ => fallback.to_string(),
        }
    }

    pub fn unit() -> TypeRef {
        Rc::new(Type::Unit)
    }

    pub fn never() -> TypeRef {
        Rc::new(Type::Never)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::SInt(w) => write!(f, "I{}", w.bits()),
            Type::UInt(w) => write!(f, "U{}", w.bits()),
            Type::Float(FloatWidth::F32) => write!(f, "F32"),
            Type::Float(FloatWidth::F64) => write!(f, "F64"),
            Type::Bool => write!(f, "Bool"),
            Type::Char => write!(f, "Char"),
            Type::Str => write!(f, "Str"),
            Type::Unit => write!(f, "Unit"),
            Type::Never => write!(f, "Never"),
            Type::Array(elem, n) => write!(f, "[{}; {}]", elem, n),
            Type::Slice(elem) => write!(f, "[{}]", elem),
            Type::Tuple(elems) => {
                write!(f, "(")?;
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, ")")
            }
            Type::Function { params, ret } => {
                write!(f, "func(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ") -> {}", ret)
            }
            Type::Closure { params, ret, .. } => {
                write!(f, "closure(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ") -> {}", ret)
            }
            Type::Named { name, args, .. } => {
                write!(f, "{}", name)?;
                if !args.is_empty() {
                    write!(f, "[")?;
                    for (i, a) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", a)?;
                    }
                    write!(f, "]")?;
                }
                Ok(())
            }
            Type::Reference { mutable, inner, .. } => {
                write!(f, "{}ref {}", if *mutable { "mut " } else { "" }, inner)
            }
            Type::Pointer { mutable, inner } => {
                write!(f, "*{}{}", if *mutable { "mut " } else { "" }, inner)
            }
            Type::Generic(name) => write!(f, "{}", name),
            Type::Var(id) => write!(f, "?{}", id.0),
            Type::ConstGeneric(name) => write!(f, "{}", name),
            Type::ConstValue(v, _) => match v {
                ConstValue::Int(i) => write!(f, "{}", i),
                ConstValue::UInt(u) => write!(f, "{}", u),
                ConstValue::Bool(b) => write!(f, "{}", b),
                ConstValue::Char(c) => write!(f, "{:?}", c),
            },
            Type::DynBehavior { name, mutable, .. } => {
                write!(f, "dyn {}{}", if *mutable { "mut " } else { "" }, name)
            }
            Type::ImplBehavior { name, .. } => write!(f, "impl {}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_are_copy() {
        assert!(Type::SInt(IntWidth::W32).is_copy());
        assert!(Type::Reference {
            mutable: false,
            lifetime: None,
            inner: Rc::new(Type::Str)
        }
        .is_copy());
    }

    #[test]
    fn named_types_are_not_copy_by_default() {
        let t = Type::Named {
            name: "List".to_string(),
            module_path: vec![],
            args: vec![Rc::new(Type::SInt(IntWidth::W32))],
        };
        assert!(!t.is_copy());
    }

    #[test]
    fn display_named_with_args() {
        let t = Type::Named {
            name: "Maybe".to_string(),
            module_path: vec![],
            args: vec![Rc::new(Type::SInt(IntWidth::W32))],
        };
        assert_eq!(t.to_string(), "Maybe[I32]");
    }
}
