//! Optional DWARF debug info emission, enabled by
//! `-g`/`CodegenOptions::emit_debug_info`. Emits DWARF 4
//! metadata: one `DIFile`/`DICompileUnit` per module, one `DISubprogram`
//! per function, and a `DILocation` attached via `!dbg` to the first
//! instruction of each statement. Kept deliberately minimal (no variable
//! or lexical-block metadata) -- enough for `clang -g` to produce
//! source-correlated backtraces and line tables without trying to
//! reproduce a full debugger experience.

use std::fmt::Write as _;

use crate::source::Span;

use super::state::CodeGen;

pub fn emit_compile_unit(cg: &mut CodeGen, source_file: &str) {
    if cg.di_file_id.is_some() {
        return;
    }
    let file_id = cg.next_debug_id();
    let cu_id = cg.next_debug_id();
    let (dir, file) = split_path(source_file);
    cg.debug_metadata.push_str(&format!(
        "!{file_id} = !DIFile(filename: \"{file}\", directory: \"{dir}\")\n"
    ));
    cg.debug_metadata.push_str(&format!(
        "!{cu_id} = distinct !DICompileUnit(language: DW_LANG_C99, file: !{file_id}, \
producer: \"tmlc\", isOptimized: false, runtimeVersion: 0, emissionKind: FullDebug)\n"
    ));
    cg.di_file_id = Some(file_id);
    cg.di_cu_id = Some(cu_id);
}

fn split_path(path: &str) -> (String, String) {
    match path.rsplit_once('/') {
        Some((dir, file)) => (dir.to_string(), file.to_string()),
        None => (".".to_string(), path.to_string()),
    }
}

/// Emit a `DISubprogram` for a function and return its metadata id, to be
/// attached to the function definition via `!dbg !N`.
pub fn emit_subprogram(cg: &mut CodeGen, name: &str, line: u32) -> usize {
    let file_id = cg.di_file_id.expect("emit_compile_unit called first");
    let cu_id = cg.di_cu_id.expect("emit_compile_unit called first");
    let id = cg.next_debug_id();
    let _ = writeln!(
        cg.debug_metadata,
        "!{id} = distinct !DISubprogram(name: \"{name}\", scope: !{file_id}, file: !{file_id}, \
line: {line}, unit: !{cu_id}, spFlags: DISPFlagDefinition)"
    );
    id
}

/// Emit a `DILocation` metadata node for one source line/column and
/// return its id for use as `!dbg !N` on the instruction it covers.
pub fn emit_location(cg: &mut CodeGen, scope_id: usize, line: u32, col: u32) -> usize {
    let id = cg.next_debug_id();
    let _ = writeln!(
        cg.debug_metadata,
        "!{id} = !DILocation(line: {line}, column: {col}, scope: !{scope_id})"
    );
    id
}

pub fn span_line_col(span: &Span, source: &crate::source::Source) -> (u32, u32) {
    let lc = source.line_col(span.start.byte);
    (lc.line, lc.column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_unit_is_only_emitted_once() {
        let mut cg = CodeGen::new();
        emit_compile_unit(&mut cg, "foo.tml");
        emit_compile_unit(&mut cg, "foo.tml");
        assert_eq!(cg.debug_metadata.matches("DICompileUnit").count(), 1);
    }

    #[test]
    fn subprogram_references_the_compile_unit() {
        let mut cg = CodeGen::new();
        emit_compile_unit(&mut cg, "foo.tml");
        let id = emit_subprogram(&mut cg, "main", 3);
        assert!(cg.debug_metadata.contains(&format!("!{} = distinct !DISubprogram", id)));
    }
}
