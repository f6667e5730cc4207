//! Cross-file reference tracking and import computation
//!
//! While a file's body is emitted, every reference to a definition is
//! routed through the `EmitCtx`, which records it and hands back the
//! local name: the plain name for same-file definitions, the
//! collision-proof `<packageId>__<name>` alias for everything else. The
//! import statements are rendered afterwards, one per referenced source
//! file, plus one for the synthetic `Any` file when it was touched.

use crate::analyzer::Semantics;
use crate::source::{FileId, SourceMap};
use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path, PathBuf};

/// File stem of the synthetic file holding the builtin `Any` pair,
/// emitted at the output root when referenced.
pub const ANY_FILE_STEM: &str = "builtin_any";

/// The alias every other file imports the builtin `Any` under
pub const ANY_ALIAS: &str = "Builtin__Any";

/// Reference collector for one output file
pub struct EmitCtx<'a> {
    pub semantics: &'a Semantics,
    current_file: Option<FileId>,
    /// Defining file of every known symbol
    home: HashMap<(String, String), FileId>,
    /// Referenced exported names that live in other files, with the file
    /// that exports them
    used: BTreeMap<(String, String), FileId>,
    uses_any: bool,
}

impl<'a> EmitCtx<'a> {
    /// Context for a regular output file
    pub fn new(semantics: &'a Semantics, current_file: FileId) -> Self {
        Self {
            semantics,
            current_file: Some(current_file),
            home: home_map(semantics),
            used: BTreeMap::new(),
            uses_any: false,
        }
    }

    /// Context for the synthetic `Any` file, where `Any` refers to itself
    pub fn for_any_file(semantics: &'a Semantics) -> Self {
        Self {
            semantics,
            current_file: None,
            home: home_map(semantics),
            used: BTreeMap::new(),
            uses_any: false,
        }
    }

    /// The local name for a definition, recording the reference.
    pub fn alias(&mut self, package: &str, name: &str) -> String {
        self.alias_member(package, name, name)
    }

    /// The local name for an exported symbol belonging to a definition.
    /// The zod emitter uses this for per-realization schema constants
    /// whose exported name carries an index suffix.
    pub fn alias_member(&mut self, package: &str, def_name: &str, symbol: &str) -> String {
        let home = self
            .home
            .get(&(package.to_string(), def_name.to_string()))
            .copied();
        if home == self.current_file {
            return symbol.to_string();
        }
        if let Some(home) = home {
            self.used
                .insert((package.to_string(), symbol.to_string()), home);
        }
        format!("{}__{}", package, symbol)
    }

    /// The local name for the builtin `Any`, recording the reference.
    pub fn any_alias(&mut self) -> String {
        if self.current_file.is_none() {
            return "Any".to_string();
        }
        self.uses_any = true;
        ANY_ALIAS.to_string()
    }

    pub fn uses_any(&self) -> bool {
        self.uses_any
    }

    /// Render the import block for this file. `out_path` is the emitted
    /// file's path relative to the output root.
    pub fn import_lines(&self, sources: &SourceMap, out_path: &Path) -> Vec<String> {
        let mut by_file: BTreeMap<PathBuf, Vec<String>> = BTreeMap::new();
        for ((package, name), &home) in &self.used {
            let target = sources.path(home).with_extension("ts");
            by_file
                .entry(target)
                .or_default()
                .push(format!("{} as {}__{}", name, package, name));
        }

        let mut lines = Vec::new();
        if self.uses_any {
            lines.push(format!(
                "import {{ Any as {} }} from \"{}\";",
                ANY_ALIAS,
                relative_import(out_path, Path::new(&format!("{}.ts", ANY_FILE_STEM)))
            ));
        }
        for (target, mut symbols) in by_file {
            symbols.sort();
            lines.push(format!(
                "import {{ {} }} from \"{}\";",
                symbols.join(", "),
                relative_import(out_path, &target)
            ));
        }
        lines
    }
}

fn home_map(semantics: &Semantics) -> HashMap<(String, String), FileId> {
    let mut home = HashMap::new();
    for def in &semantics.messages {
        home.insert((def.package.clone(), def.name.clone()), def.file);
    }
    for def in &semantics.enums {
        home.insert((def.package.clone(), def.name.clone()), def.file);
    }
    for def in &semantics.string_enums {
        home.insert((def.package.clone(), def.name.clone()), def.file);
    }
    home
}

/// The module specifier for importing `to` from `from`, both relative to
/// the output root. The `.ts` extension is dropped.
pub fn relative_import(from: &Path, to: &Path) -> String {
    let from_dir: Vec<Component> = from.parent().map(collect_components).unwrap_or_default();
    let to_components: Vec<Component> = collect_components(to);

    let common = from_dir
        .iter()
        .zip(to_components.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = Vec::new();
    for _ in common..from_dir.len() {
        parts.push("..".to_string());
    }
    for component in &to_components[common..] {
        parts.push(component.as_os_str().to_string_lossy().into_owned());
    }
    let mut spec = parts.join("/");
    if let Some(stripped) = spec.strip_suffix(".ts") {
        spec = stripped.to_string();
    }
    if !spec.starts_with("..") {
        spec = format!("./{}", spec);
    }
    spec
}

fn collect_components(path: &Path) -> Vec<Component> {
    path.components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_import_same_dir() {
        assert_eq!(
            relative_import(Path::new("b.ts"), Path::new("a.ts")),
            "./a"
        );
    }

    #[test]
    fn test_relative_import_into_subdir() {
        assert_eq!(
            relative_import(Path::new("b.ts"), Path::new("sub/a.ts")),
            "./sub/a"
        );
    }

    #[test]
    fn test_relative_import_out_of_subdir() {
        assert_eq!(
            relative_import(Path::new("x/y/b.ts"), Path::new("a.ts")),
            "../../a"
        );
    }

    #[test]
    fn test_relative_import_sibling_dirs() {
        assert_eq!(
            relative_import(Path::new("x/b.ts"), Path::new("y/a.ts")),
            "../y/a"
        );
    }
}
