//! TML Compiler CLI
//!
//! Command-line driver for `tmlc`: compiles a single TML source file to an
//! executable via the external LLVM toolchain, or dumps an intermediate
//! representation (`--emit-llvm`, `--emit-ast`, `--emit-tokens`) for
//! debugging the pipeline itself. Argument parsing is intentionally thin:
//! this file only adapts `clap`'s `Args` into `tmlc::config::CodegenOptions`
//! and calls into the library.

use std::path::PathBuf;
use std::process;

use clap::Parser as ClapParser;

use tmlc::config::{CodegenOptions, OptimizationLevel};
use tmlc::project_config::TmlConfig;

#[derive(ClapParser)]
#[command(name = "tmlc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "TML compiler - compile .tml programs to executables", long_about = None)]
struct Cli {
    /// Input .tml source file
    input: PathBuf,

    /// Output executable path (defaults to the input filename without its
    /// extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Emit LLVM IR text (.ll) instead of invoking the linker
    #[arg(long)]
    emit_llvm: bool,

    /// Dump the parsed AST (debug form) and exit, running no later pass
    #[arg(long)]
    emit_ast: bool,

    /// Dump the token stream and exit, running no later pass
    #[arg(long)]
    emit_tokens: bool,

    /// Keep the intermediate .ll file after linking
    #[arg(long)]
    keep_ir: bool,

    /// Emit DWARF debug metadata alongside the IR
    #[arg(short = 'g', long)]
    debug_info: bool,

    /// Optimization level forwarded to the external LLVM toolchain
    #[arg(short = 'O', long, value_name = "LEVEL", default_value = "0")]
    opt_level: u8,

    /// LLVM target triple, e.g. x86_64-unknown-linux-gnu
    #[arg(long)]
    target: Option<String>,

    /// Instrument emitted code with coverage counters
    #[arg(long)]
    coverage: bool,

    /// Emit a companion C header for every `pub` top-level function
    #[arg(long)]
    emit_c_header: bool,

    /// Suppress informational output
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    if !cli.quiet {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .init();
    }

    let project_dir = cli
        .input
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    let project_config = match TmlConfig::load_from_dir(&project_dir) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    let mut opts = project_config.apply(&cli.input);
    opts.emit_debug_info = opts.emit_debug_info || cli.debug_info;
    opts.coverage_enabled = opts.coverage_enabled || cli.coverage;
    opts.emit_c_header = opts.emit_c_header || cli.emit_c_header;
    if let Some(target) = &cli.target {
        opts.target_triple = Some(target.clone());
    }
    opts.optimization_level = match cli.opt_level {
        0 => OptimizationLevel::O0,
        1 => OptimizationLevel::O1,
        2 => OptimizationLevel::O2,
        _ => OptimizationLevel::O3,
    };

    if cli.emit_tokens {
        run_emit_tokens(&cli.input);
        return;
    }
    if cli.emit_ast {
        run_emit_ast(&cli.input);
        return;
    }

    let output = cli.output.clone().unwrap_or_else(|| {
        let stem = cli.input.file_stem().unwrap_or_default();
        PathBuf::from(stem)
    });

    if cli.emit_llvm {
        run_emit_llvm(&cli.input, &output, &opts);
    } else {
        run_build(&cli.input, &output, cli.keep_ir, &opts);
    }
}

fn run_build(input: &PathBuf, output: &PathBuf, keep_ir: bool, opts: &CodegenOptions) {
    match tmlc::compile_file(input, output, keep_ir, opts) {
        Ok(()) => {
            println!("Compiled {} -> {}", input.display(), output.display());
            if keep_ir {
                let ir_path = output.with_extension("ll");
                if ir_path.exists() {
                    println!("IR saved to {}", ir_path.display());
                }
            }
        }
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}

fn run_emit_llvm(input: &PathBuf, output: &PathBuf, opts: &CodegenOptions) {
    match tmlc::compile_file_to_ir(input, opts) {
        Ok(ir) => {
            let ir_path = output.with_extension("ll");
            if let Err(e) = std::fs::write(&ir_path, &ir) {
                eprintln!("error: failed to write {}: {}", ir_path.display(), e);
                process::exit(1);
            }
            println!("IR written to {}", ir_path.display());
        }
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}

fn run_emit_tokens(input: &PathBuf) {
    let text = match std::fs::read_to_string(input) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: failed to read {}: {}", input.display(), e);
            process::exit(1);
        }
    };
    let source = tmlc::source::Source::new(input.clone(), text);
    let (tokens, errors) = tmlc::lexer::tokenize(&source);
    for tok in &tokens {
        println!("{:?} {:?}", tok.kind, tok.lexeme);
    }
    if !errors.is_empty() {
        for e in errors {
            eprintln!("{}", e.into_diagnostic().render(&source));
        }
        process::exit(1);
    }
}

fn run_emit_ast(input: &PathBuf) {
    let text = match std::fs::read_to_string(input) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: failed to read {}: {}", input.display(), e);
            process::exit(1);
        }
    };
    let source = tmlc::source::Source::new(input.clone(), text);
    let (tokens, lex_errors) = tmlc::lexer::tokenize(&source);
    if !lex_errors.is_empty() {
        for e in lex_errors {
            eprintln!("{}", e.into_diagnostic().render(&source));
        }
        process::exit(1);
    }
    let parser = tmlc::parser::Parser::new(tokens);
    let (ast, parse_errors) = parser.parse_module();
    if !parse_errors.is_empty() {
        for e in parse_errors {
            eprintln!("{}", e.into_diagnostic().render(&source));
        }
        process::exit(1);
    }
    println!("{:#?}", ast);
}
