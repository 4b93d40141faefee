//! TML Compiler Library
//!
//! A whole-program ahead-of-time compiler for the TML language: lexer,
//! parser, type checker, borrow checker, and LLVM IR generator. This
//! crate is the core pipeline only -- CLI argument parsing, package
//! management, and the runtime C support library are external
//! collaborators.
//!
//! # Extending the compiler
//!
//! Driving the pipeline directly, without touching an external toolchain,
//! looks like:
//!
//! ```rust,ignore
//! use tmlc::{compile_to_ir, config::CodegenOptions};
//!
//! let opts = CodegenOptions::for_source_file("hello.tml");
//! let ir = compile_to_ir("func main() -> Unit { println(\"hi\") }", &opts)?;
//! ```

pub mod ast;
pub mod borrow;
pub mod codegen;
pub mod config;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod project_config;
pub mod sem;
pub mod source;

use std::fmt;
use std::fs;
use std::path::Path;
use std::process::Command;

use tracing::debug_span;

use crate::ast::decls::ModuleAst;
use crate::config::CodegenOptions;
use crate::diagnostics::DiagnosticBag;
use crate::sem::{ModuleRegistry, TypeEnv};
use crate::source::Source;

/// Aggregates every phase-local error enum behind one top-level type:
/// each phase accumulates its own diagnostics, but the driver needs one
/// `Result` to report back to `main.rs` or a caller embedding this crate
/// as a library.
#[derive(Debug)]
pub enum CompileError {
    /// Unreadable source file or unwritable output; fatal I/O aborts the
    /// pipeline immediately.
    Io(String),
    /// The lexer, parser, type checker, or borrow checker reported one or
    /// more diagnostics and the pipeline refused to advance to the next
    /// stage.
    Diagnostics(String),
    /// The code generator could not lower a construct it encountered.
    CodeGen(String),
    /// The external LLVM toolchain (`clang`) failed to assemble/link the
    /// emitted IR.
    Toolchain(String),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Io(msg) => write!(f, "I/O error: {}", msg),
            CompileError::Diagnostics(msg) => write!(f, "{}", msg),
            CompileError::CodeGen(msg) => write!(f, "codegen error: {}", msg),
            CompileError::Toolchain(msg) => write!(f, "toolchain error: {}", msg),
        }
    }
}

impl std::error::Error for CompileError {}

/// Lex + parse one source file into a [`ModuleAst`], reporting every
/// accumulated [`lexer::LexError`]/[`parser::ParseError`] as a single
/// rendered [`CompileError::Diagnostics`] if either pass failed: parsing
/// never starts on a lex error, matching the rest of the pipeline's
/// refusal to advance past a failed pass.
fn lex_and_parse(source: &Source) -> Result<ModuleAst, CompileError> {
    let lex_span = debug_span!("lex", file = %source.path().display());
    let _enter = lex_span.enter();
    let (tokens, lex_errors) = lexer::tokenize(source);
    if !lex_errors.is_empty() {
        let mut bag = DiagnosticBag::new();
        for e in lex_errors {
            bag.push(e.into_diagnostic());
        }
        return Err(CompileError::Diagnostics(bag.render_all(source)));
    }
    drop(_enter);

    let parse_span = debug_span!("parse", tokens = tokens.len());
    let _enter = parse_span.enter();
    let parser = parser::Parser::new(tokens);
    let (ast, parse_errors) = parser.parse_module();
    if !parse_errors.is_empty() {
        let mut bag = DiagnosticBag::new();
        for e in parse_errors {
            bag.push(e.into_diagnostic());
        }
        return Err(CompileError::Diagnostics(bag.render_all(source)));
    }
    Ok(ast)
}

/// Run the type checker and, if it accepted the module, the borrow
/// checker. Returns the
/// populated [`TypeEnv`] on success.
fn check(ast: &ModuleAst, source: &Source) -> Result<TypeEnv, CompileError> {
    let module_path = vec!["main".to_string()];
    let mut env = TypeEnv::new(ModuleRegistry::new());

    let decl_span = debug_span!("typecheck.decls", decls = ast.decls.len());
    let _enter = decl_span.enter();
    let modules = vec![(
        module_path.clone(),
        source.path().to_path_buf(),
        source.text().to_string(),
        ast.clone(),
    )];
    let decl_errors = crate::sem::check::register_all_declarations(&modules, &mut env);
    if decl_errors.iter().any(|e| !e.kind.is_warning()) {
        let mut bag = DiagnosticBag::new();
        for e in decl_errors {
            bag.push(e.into_diagnostic());
        }
        return Err(CompileError::Diagnostics(bag.render_all(source)));
    }
    drop(_enter);

    let body_span = debug_span!("typecheck.bodies");
    let _enter = body_span.enter();
    let checked = crate::sem::check::check_module(ast, &module_path, &mut env);
    let mut bag = DiagnosticBag::new();
    for e in decl_errors {
        bag.push(e.into_diagnostic());
    }
    for e in checked.errors {
        bag.push(e.into_diagnostic());
    }
    if bag.has_errors() {
        return Err(CompileError::Diagnostics(bag.render_all(source)));
    }
    drop(_enter);

    let borrow_span = debug_span!("borrowck");
    let _enter = borrow_span.enter();
    let borrow_errors = borrow::check_decls(&ast.decls);
    if !borrow_errors.is_empty() {
        let mut bag = DiagnosticBag::new();
        for e in borrow_errors {
            bag.push(e.into_diagnostic());
        }
        return Err(CompileError::Diagnostics(bag.render_all(source)));
    }

    Ok(env)
}

/// Compile `source_text` (already read into memory, e.g. for library
/// embedding or tests) straight through to LLVM IR text, skipping the
/// external linker invocation entirely.
pub fn compile_to_ir(source_text: &str, opts: &CodegenOptions) -> Result<String, CompileError> {
    let source = Source::new(opts.source_file.clone(), source_text.to_string());
    let ast = lex_and_parse(&source)?;
    check(&ast, &source)?;

    let codegen_span = debug_span!("codegen", decls = ast.decls.len());
    let _enter = codegen_span.enter();
    let module_name = module_name_from_path(&opts.source_file);
    crate::codegen::codegen_module(&module_name, &ast.decls, opts)
        .map_err(|e| CompileError::CodeGen(e.to_string()))
}

/// Compile `source_path` to an `.ll` text file at `output_path` (forced to
/// have a `.ll` extension), performing every pass up through code
/// generation but never invoking an external toolchain. Used by
/// `--emit-llvm`.
pub fn compile_file_to_ir(source_path: &Path, opts: &CodegenOptions) -> Result<String, CompileError> {
    let text = fs::read_to_string(source_path)
        .map_err(|e| CompileError::Io(format!("failed to read {}: {}", source_path.display(), e)))?;
    compile_to_ir(&text, opts)
}

/// Full build: compile `source_path` to LLVM IR, then invoke the external
/// `clang` toolchain to assemble and link an executable at `output_path`
///.
/// The intermediate `.ll` file is removed afterward unless `keep_ir` is
/// set.
pub fn compile_file(
    source_path: &Path,
    output_path: &Path,
    keep_ir: bool,
    opts: &CodegenOptions,
) -> Result<(), CompileError> {
    let ir = compile_file_to_ir(source_path, opts)?;

    let ir_path = output_path.with_extension("ll");
    fs::write(&ir_path, &ir)
        .map_err(|e| CompileError::Io(format!("failed to write {}: {}", ir_path.display(), e)))?;

    let toolchain_span = debug_span!("link", output = %output_path.display());
    let _enter = toolchain_span.enter();

    let mut clang = Command::new("clang");
    clang.arg(opts.optimization_level.as_flag());
    if let Some(triple) = &opts.target_triple {
        clang.arg("--target").arg(triple);
    }
    clang.arg(&ir_path).arg("-o").arg(output_path);

    let result = clang
        .output()
        .map_err(|e| CompileError::Toolchain(format!("failed to run clang: {}", e)))?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        return Err(CompileError::Toolchain(format!(
            "clang failed assembling/linking {}:\n{}",
            ir_path.display(),
            stderr
        )));
    }

    if opts.emit_c_header {
        let ast = parse_for_header(source_path)?;
        let module_name = module_name_from_path(source_path);
        let header = crate::codegen::generate_c_header(&module_name, &ast.decls);
        let header_path = output_path.with_extension("h");
        fs::write(&header_path, header)
            .map_err(|e| CompileError::Io(format!("failed to write {}: {}", header_path.display(), e)))?;
    }

    if !keep_ir {
        let _ = fs::remove_file(&ir_path);
    }

    Ok(())
}

/// Re-lex/parse a source file for C-header emission after the main build
/// already ran -- cheap relative to the link step above, and keeps
/// `compile_file` from having to thread the AST back out of
/// `compile_to_ir`.
fn parse_for_header(source_path: &Path) -> Result<ModuleAst, CompileError> {
    let text = fs::read_to_string(source_path)
        .map_err(|e| CompileError::Io(format!("failed to read {}: {}", source_path.display(), e)))?;
    let source = Source::new(source_path.to_path_buf(), text);
    lex_and_parse(&source)
}

fn module_name_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "main".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_a_trivial_function_to_ir() {
        let opts = CodegenOptions::for_source_file("t.tml");
        let ir = compile_to_ir("func main() -> Unit {\n}\n", &opts).unwrap();
        assert!(ir.contains("define"));
    }

    #[test]
    fn reports_diagnostics_on_parse_error() {
        let opts = CodegenOptions::for_source_file("t.tml");
        let err = compile_to_ir("func main( -> Unit {\n}\n", &opts).unwrap_err();
        match err {
            CompileError::Diagnostics(msg) => assert!(!msg.is_empty()),
            other => panic!("expected Diagnostics, got {:?}", other),
        }
    }

    #[test]
    fn module_name_from_path_strips_extension() {
        assert_eq!(module_name_from_path(Path::new("hello.tml")), "hello");
        assert_eq!(module_name_from_path(Path::new("/a/b/c.tml")), "c");
    }
}
