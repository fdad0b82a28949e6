use std::path::{Path, PathBuf};

use anyhow::Context as _;
use gridlet_engine::core::{Editor, Variant};
use gridlet_engine::presets::{default_source, find_preset, PRESETS};

use crate::watch::OwnWrites;

/// Editor backed by a file on disk; the user edits it with any text editor.
///
/// Reads happen on every render so the latest saved text is always used.
#[derive(Debug, Clone)]
pub struct FileEditor {
    path: PathBuf,
    own_writes: OwnWrites,
}

impl FileEditor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), own_writes: OwnWrites::default() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Handle for a watcher that should skip this editor's writes.
    pub fn own_writes(&self) -> OwnWrites {
        self.own_writes.clone()
    }
}

impl Editor for FileEditor {
    fn value(&self) -> String {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) => {
                // An empty program fails to compile, which keeps the last frame.
                log::warn!("cannot read {}: {e}", self.path.display());
                String::new()
            }
        }
    }

    fn set_value(&mut self, text: &str) {
        // Recorded first so a poll landing right after the write sees it.
        self.own_writes.record(text);
        if let Err(e) = std::fs::write(&self.path, text) {
            self.own_writes.forget();
            log::error!("cannot write {}: {e}", self.path.display());
        }
    }
}

/// Makes sure `path` holds a program before the session starts.
///
/// A named preset overwrites the file; otherwise a missing file is created
/// with the starter program for `variant` and an existing one is left alone.
pub fn prepare_source(path: &Path, variant: Variant, preset: Option<&str>) -> anyhow::Result<()> {
    let text = match preset {
        Some(name) => {
            let Some(p) = find_preset(name) else {
                let names: Vec<&str> = PRESETS.iter().map(|p| p.name).collect();
                anyhow::bail!("unknown preset `{name}` (available: {})", names.join(", "));
            };
            if p.animated != variant.is_animated() {
                log::warn!("preset `{}` is meant for the other mode", p.name);
            }
            p.source
        }
        None if path.exists() => return Ok(()),
        None => default_source(variant),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create source dir '{}'", parent.display()))?;
    }
    std::fs::write(path, text).with_context(|| format!("write source '{}'", path.display()))?;
    log::info!("wrote program to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("gridlet-editor-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let _ = std::fs::remove_file(&path);
        path
    }

    #[test]
    fn reads_and_writes_file() {
        let path = scratch("rw.js");
        std::fs::write(&path, "function color() { return 1 }").unwrap();
        let mut ed = FileEditor::new(&path);
        assert_eq!(ed.value(), "function color() { return 1 }");
        ed.set_value("x");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x");
    }

    #[test]
    fn set_value_marks_its_own_write() {
        let path = scratch("marked.js");
        let mut ed = FileEditor::new(&path);
        let own = ed.own_writes();
        ed.set_value("function color() { return 2 }");
        assert!(own.claim("function color() { return 2 }"));
    }

    #[test]
    fn failed_write_leaves_no_mark() {
        let dir = scratch("not-a-dir");
        std::fs::write(&dir, "file").unwrap();
        let mut ed = FileEditor::new(dir.join("inner.js"));
        let own = ed.own_writes();
        ed.set_value("x");
        assert!(!own.claim("x"));
    }

    #[test]
    fn missing_file_reads_empty() {
        let ed = FileEditor::new(scratch("missing.js"));
        assert_eq!(ed.value(), "");
    }

    #[test]
    fn prepare_creates_starter() {
        let path = scratch("starter.js");
        prepare_source(&path, Variant::Animated, None).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), default_source(Variant::Animated));
    }

    #[test]
    fn prepare_keeps_existing_file() {
        let path = scratch("keep.js");
        std::fs::write(&path, "mine").unwrap();
        prepare_source(&path, Variant::Still, None).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "mine");
    }

    #[test]
    fn prepare_with_preset_overwrites() {
        let path = scratch("preset.js");
        std::fs::write(&path, "mine").unwrap();
        prepare_source(&path, Variant::Still, Some("xor")).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("x ^ y"));
    }

    #[test]
    fn prepare_rejects_unknown_preset() {
        let err = prepare_source(&scratch("bad.js"), Variant::Still, Some("zigzag")).unwrap_err();
        assert!(err.to_string().contains("available: diagonal"));
    }
}
