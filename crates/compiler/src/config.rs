//! Compiler-wide configuration.
//!
//! Every knob that affects code generation is an explicit field on
//! [`CodegenOptions`], threaded through the pipeline as a value — never a
//! global. [`crate::project_config::TmlConfig`] loads the on-disk
//! defaults; callers (the CLI or a library embedder) then override
//! individual fields before passing the options on.

use std::path::PathBuf;

/// Optimization level requested of the *external* LLVM toolchain. The core
/// never performs its own optimization passes — this is forwarded verbatim
/// to `clang`/`opt` as `-O{level}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OptimizationLevel {
    O0,
    O1,
    O2,
    O3,
}

impl OptimizationLevel {
    pub fn as_flag(self) -> &'static str {
        match self {
            OptimizationLevel::O0 => "-O0",
            OptimizationLevel::O1 => "-O1",
            OptimizationLevel::O2 => "-O2",
            OptimizationLevel::O3 => "-O3",
        }
    }
}

impl Default for OptimizationLevel {
    fn default() -> Self {
        OptimizationLevel::O0
    }
}

/// Code generation options, threaded explicitly through `codegen`.
#[derive(Debug, Clone)]
pub struct CodegenOptions {
    /// Emit DWARF debug metadata (`DIFile`/`DICompileUnit`/`DISubprogram`/
    /// `DILocation`) alongside the IR.
    pub emit_debug_info: bool,
    /// Path of the source file being compiled, recorded in `DIFile` and
    /// used to resolve relative `include`/`use` paths.
    pub source_file: PathBuf,
    /// Instrument emitted functions/lines/branches with
    /// `tml_cover_func`/`tml_cover_line`/`tml_cover_branch` calls.
    pub coverage_enabled: bool,
    /// Suppress the coverage report-printing call normally emitted at the
    /// end of `main` (used by test harnesses that capture coverage data
    /// out of band).
    pub coverage_quiet: bool,
    /// When compiling one of several mangled test variants of a module
    /// (internal-linkage test doubles), the suite index is folded into the
    /// mangled name prefix `sN_` so symbols from different test suites
    /// never collide in a single linked binary.
    pub suite_test_index: Option<u32>,
    /// Force every emitted top-level definition to `internal` linkage,
    /// overriding the default of "internal unless `pub`".
    pub force_internal_linkage: bool,
    pub optimization_level: OptimizationLevel,
    /// LLVM target triple, e.g. `x86_64-unknown-linux-gnu`. `None` lets the
    /// textual IR omit `target triple`, deferring to the host default.
    pub target_triple: Option<String>,
    /// Emit a companion C header for every `pub` top-level
    /// function of the compiled module. Only meaningful for library
    /// builds; ignored for `main`-having binaries.
    pub emit_c_header: bool,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        CodegenOptions {
            emit_debug_info: false,
            source_file: PathBuf::from("<anonymous>"),
            coverage_enabled: false,
            coverage_quiet: false,
            suite_test_index: None,
            force_internal_linkage: false,
            optimization_level: OptimizationLevel::default(),
            target_triple: None,
            emit_c_header: false,
        }
    }
}

impl CodegenOptions {
    pub fn for_source_file(path: impl Into<PathBuf>) -> Self {
        CodegenOptions {
            source_file: path.into(),
            ..Default::default()
        }
    }
}
