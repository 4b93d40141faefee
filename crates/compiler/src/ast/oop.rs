//! C#-style OOP overlay: classes and interfaces.

use super::decls::{ConstParam, Decorator, FuncSignature, GenericParam, Visibility};
use super::exprs::Expr;
use super::types::TypeNode;
use crate::source::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberModifier {
    None,
    Virtual,
    Override,
    Abstract,
    Sealed,
    Static,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassField {
    pub name: String,
    pub ty: TypeNode,
    pub visibility: Visibility,
    pub modifier: MemberModifier,
    pub default: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassMethod {
    pub sig: FuncSignature,
    /// `None` for an `abstract` method declared but not defined here.
    pub body: Option<Expr>,
    pub visibility: Visibility,
    pub modifier: MemberModifier,
    pub decorators: Vec<Decorator>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassProperty {
    pub name: String,
    pub ty: TypeNode,
    pub getter: Option<Expr>,
    pub setter: Option<(String, Expr)>,
    pub visibility: Visibility,
    pub modifier: MemberModifier,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassConstructor {
    pub params: Vec<super::decls::FuncParam>,
    /// Arguments forwarded to the base class constructor, if any
    /// (`class Foo extends Bar { new(x) : base(x) { .. } }`).
    pub base_args: Vec<Expr>,
    pub body: Expr,
    pub visibility: Visibility,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: String,
    pub generics: Vec<GenericParam>,
    pub const_generics: Vec<ConstParam>,
    pub extends: Option<TypeNode>,
    pub implements: Vec<TypeNode>,
    pub fields: Vec<ClassField>,
    pub methods: Vec<ClassMethod>,
    pub properties: Vec<ClassProperty>,
    pub constructor: Option<ClassConstructor>,
    pub is_abstract: bool,
    pub is_sealed: bool,
    pub visibility: Visibility,
    pub decorators: Vec<Decorator>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceMethod {
    pub sig: FuncSignature,
    /// A default method body, if the interface provides one.
    pub default_body: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceDecl {
    pub name: String,
    pub generics: Vec<GenericParam>,
    pub extends: Vec<TypeNode>,
    pub methods: Vec<InterfaceMethod>,
    pub visibility: Visibility,
    pub span: Span,
}
