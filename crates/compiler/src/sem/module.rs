//! The module registry: a single map, owned by the driving `Context`
//! rather than any global, from qualified module path to a
//! [`ModuleRecord`].

use std::collections::HashMap;
use std::path::PathBuf;

use crate::ast::decls::{
    BehaviorDecl, ConstDecl, EnumDecl, FuncDecl, StructDecl, TypeAliasDecl, UnionDecl,
};
use crate::ast::oop::{ClassDecl, InterfaceDecl};
use crate::source::Span;

/// How a re-export was written at its source module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReExportKind {
    Glob,
    Selected(String),
    Aliased { original: String, alias: String },
}

#[derive(Debug, Clone)]
pub struct ReExport {
    pub source_path: Vec<String>,
    pub kind: ReExportKind,
    pub span: Span,
}

/// One module's worth of declarations. Functions may have multiple
/// overloads, hence `Vec<FuncDecl>` per name.
#[derive(Debug, Clone, Default)]
pub struct ModuleRecord {
    pub path: Vec<String>,
    pub functions: HashMap<String, Vec<FuncDecl>>,
    pub structs: HashMap<String, StructDecl>,
    pub unions: HashMap<String, UnionDecl>,
    pub enums: HashMap<String, EnumDecl>,
    pub behaviors: HashMap<String, BehaviorDecl>,
    pub type_aliases: HashMap<String, TypeAliasDecl>,
    pub constants: HashMap<String, ConstDecl>,
    pub classes: HashMap<String, ClassDecl>,
    pub interfaces: HashMap<String, InterfaceDecl>,
    pub submodules: Vec<String>,
    pub re_exports: Vec<ReExport>,
    pub source_text: String,
    pub source_file: PathBuf,
    pub default_visibility: crate::ast::decls::Visibility,
}

impl ModuleRecord {
    pub fn new(path: Vec<String>, source_text: String, source_file: PathBuf) -> Self {
        ModuleRecord {
            path,
            source_text,
            source_file,
            default_visibility: crate::ast::decls::Visibility::Private,
            ..Default::default()
        }
    }

    /// Any top-level symbol with this local name, across every kind.
    pub fn has_symbol(&self, name: &str) -> bool {
        self.functions.contains_key(name)
            || self.structs.contains_key(name)
            || self.unions.contains_key(name)
            || self.enums.contains_key(name)
            || self.behaviors.contains_key(name)
            || self.type_aliases.contains_key(name)
            || self.constants.contains_key(name)
            || self.classes.contains_key(name)
            || self.interfaces.contains_key(name)
    }

    pub fn all_symbol_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        names.extend(self.functions.keys().cloned());
        names.extend(self.structs.keys().cloned());
        names.extend(self.unions.keys().cloned());
        names.extend(self.enums.keys().cloned());
        names.extend(self.behaviors.keys().cloned());
        names.extend(self.type_aliases.keys().cloned());
        names.extend(self.constants.keys().cloned());
        names.extend(self.classes.keys().cloned());
        names.extend(self.interfaces.keys().cloned());
        names
    }
}

/// Map from qualified module path (`a::b::c`) to its record, plus the
/// reverse file-path → module-path mapping a driver needs to attribute
/// diagnostics back to the file that produced them.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: HashMap<String, ModuleRecord>,
    file_to_module: HashMap<PathBuf, String>,
}

fn join_path(path: &[String]) -> String {
    path.join("::")
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: ModuleRecord) {
        let key = join_path(&record.path);
        self.file_to_module
            .insert(record.source_file.clone(), key.clone());
        self.modules.insert(key, record);
    }

    pub fn get(&self, path: &[String]) -> Option<&ModuleRecord> {
        self.modules.get(&join_path(path))
    }

    pub fn get_mut(&mut self, path: &[String]) -> Option<&mut ModuleRecord> {
        self.modules.get_mut(&join_path(path))
    }

    pub fn module_for_file(&self, file: &std::path::Path) -> Option<&str> {
        self.file_to_module.get(file).map(|s| s.as_str())
    }

    pub fn modules(&self) -> impl Iterator<Item = &ModuleRecord> {
        self.modules.values()
    }

    /// Resolve glob/selected/aliased re-exports to a fixed point: a
    /// bounded loop over a visited set, not a general graph algorithm.
    /// Returns the set of `(module_path, local_name)` pairs that became
    /// newly visible.
    pub fn resolve_re_exports(&mut self) {
        let module_keys: Vec<String> = self.modules.keys().cloned().collect();
        loop {
            let mut changed = false;
            for key in &module_keys {
                let re_exports = match self.modules.get(key) {
                    Some(m) => m.re_exports.clone(),
                    None => continue,
                };
                for re in &re_exports {
                    let source_key = join_path(&re.source_path);
                    let source_names: Vec<String> = match self.modules.get(&source_key) {
                        Some(src) => match &re.kind {
                            ReExportKind::Glob => src.all_symbol_names(),
                            ReExportKind::Selected(name) => vec![name.clone()],
                            ReExportKind::Aliased { original, .. } => vec![original.clone()],
                        },
                        None => continue,
                    };
                    for name in source_names {
                        let already = self
                            .modules
                            .get(key)
                            .map(|m| m.has_symbol(&name))
                            .unwrap_or(true);
                        if !already {
                            changed |= self.copy_symbol(&source_key, key, &name);
                        }
                    }
                }
            }
            if !changed {
                break;
            }
        }
    }

    fn copy_symbol(&mut self, from: &str, to: &str, name: &str) -> bool {
        let src = match self.modules.get(from) {
            Some(m) => m.clone(),
            None => return false,
        };
        let mut copied = false;
        if let Some(f) = src.functions.get(name) {
            let f = f.clone();
            self.modules
                .get_mut(to)
                .unwrap()
                .functions
                .insert(name.to_string(), f);
            copied = true;
        }
        if let Some(s) = src.structs.get(name) {
            self.modules
                .get_mut(to)
                .unwrap()
                .structs
                .insert(name.to_string(), s.clone());
            copied = true;
        }
        if let Some(e) = src.enums.get(name) {
            self.modules
                .get_mut(to)
                .unwrap()
                .enums
                .insert(name.to_string(), e.clone());
            copied = true;
        }
        if let Some(b) = src.behaviors.get(name) {
            self.modules
                .get_mut(to)
                .unwrap()
                .behaviors
                .insert(name.to_string(), b.clone());
            copied = true;
        }
        if let Some(c) = src.classes.get(name) {
            self.modules
                .get_mut(to)
                .unwrap()
                .classes
                .insert(name.to_string(), c.clone());
            copied = true;
        }
        if let Some(i) = src.interfaces.get(name) {
            self.modules
                .get_mut(to)
                .unwrap()
                .interfaces
                .insert(name.to_string(), i.clone());
            copied = true;
        }
        copied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_to_module_lookup() {
        let mut reg = ModuleRegistry::new();
        reg.insert(ModuleRecord::new(
            vec!["a".into(), "b".into()],
            "".into(),
            PathBuf::from("a/b.tml"),
        ));
        assert_eq!(
            reg.module_for_file(std::path::Path::new("a/b.tml")),
            Some("a::b")
        );
    }

    #[test]
    fn glob_reexport_fixpoint_copies_symbols() {
        let mut reg = ModuleRegistry::new();
        let mut src = ModuleRecord::new(vec!["src".into()], "".into(), PathBuf::from("src.tml"));
        src.structs.insert(
            "Point".into(),
            StructDecl {
                name: "Point".into(),
                generics: vec![],
                const_generics: vec![],
                fields: vec![],
                visibility: crate::ast::decls::Visibility::Public,
                decorators: vec![],
                span: Span::at(0),
            },
        );
        reg.insert(src);
        let mut dst = ModuleRecord::new(vec!["dst".into()], "".into(), PathBuf::from("dst.tml"));
        dst.re_exports.push(ReExport {
            source_path: vec!["src".into()],
            kind: ReExportKind::Glob,
            span: Span::at(0),
        });
        reg.insert(dst);
        reg.resolve_re_exports();
        assert!(reg.get(&["dst".into()]).unwrap().structs.contains_key("Point"));
    }
}
