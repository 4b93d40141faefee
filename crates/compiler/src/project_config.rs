//! Optional `tml.toml` project defaults.
//!
//! This is the one concession to "build orchestration" the core otherwise
//! stays out of: a thin, `serde`-backed adapter that fills in
//! [`CodegenOptions`] defaults before CLI flags override them. Nothing here
//! is consulted by `codegen` itself — only `main.rs` reads it.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::{CodegenOptions, OptimizationLevel};

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct TmlConfig {
    #[serde(default)]
    pub debug_info: bool,
    #[serde(default)]
    pub coverage: bool,
    #[serde(default)]
    pub optimization_level: Option<u8>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub emit_c_header: bool,
}

impl TmlConfig {
    /// Load `tml.toml` from `dir` if it exists; a missing file is not an
    /// error (the defaults in [`CodegenOptions`] apply), but a malformed one
    /// is.
    pub fn load_from_dir(dir: &Path) -> Result<Self, String> {
        let path = dir.join("tml.toml");
        if !path.exists() {
            return Ok(TmlConfig::default());
        }
        let text = fs::read_to_string(&path)
            .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
        toml::from_str(&text).map_err(|e| format!("failed to parse {}: {}", path.display(), e))
    }

    /// Build a [`CodegenOptions`] seeded from this config, for `source_file`.
    /// CLI flags are applied on top by the caller after this returns.
    pub fn apply(&self, source_file: impl Into<PathBuf>) -> CodegenOptions {
        let mut opts = CodegenOptions::for_source_file(source_file);
        opts.emit_debug_info = self.debug_info;
        opts.coverage_enabled = self.coverage;
        opts.emit_c_header = self.emit_c_header;
        opts.target_triple = self.target.clone();
        opts.optimization_level = match self.optimization_level {
            Some(0) => OptimizationLevel::O0,
            Some(1) => OptimizationLevel::O1,
            Some(2) => OptimizationLevel::O2,
            Some(3) => OptimizationLevel::O3,
            _ => OptimizationLevel::default(),
        };
        opts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = std::env::temp_dir();
        let cfg = TmlConfig::load_from_dir(&dir.join("definitely-not-a-real-subdir-xyz")).unwrap();
        assert!(!cfg.debug_info);
    }

    #[test]
    fn parses_minimal_toml() {
        let cfg: TmlConfig = toml::from_str("debug-info = true\noptimization-level = 2\n").unwrap();
        assert!(cfg.debug_info);
        assert_eq!(cfg.optimization_level, Some(2));
    }
}
