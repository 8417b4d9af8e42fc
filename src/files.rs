use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

pub const APP_DIR_NAME: &str = "HuntOverlay";
pub const POI_DATA_FILE: &str = "data.json";
pub const STYLE_DATA_FILE: &str = "poiData.json";
pub const CONFIG_FILE: &str = "config.json";
pub const LOG_FILE: &str = "overlay.log";

pub enum SeedResult {
    Existing { path: PathBuf },
    Copied { path: PathBuf, from: PathBuf },
}

impl SeedResult {
    pub fn path(&self) -> &Path {
        match self {
            SeedResult::Existing { path } | SeedResult::Copied { path, .. } => path,
        }
    }
}

/// Per-user runtime folder, `<local data dir>/HuntOverlay`.
pub fn runtime_dir() -> PathBuf {
    dirs_next::data_local_dir()
        .or_else(dirs_next::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

/// Folders searched for bundled dataset files: next to the executable, then
/// the working directory.
pub fn bundle_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        dirs.push(dir);
    }
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.contains(&cwd) {
            dirs.push(cwd);
        }
    }
    dirs
}

/// Make sure `name` exists in `runtime_dir`, copying the first bundled copy
/// found in `sources` when it does not.
pub fn ensure_user_file(runtime_dir: &Path, name: &str, sources: &[PathBuf]) -> Result<SeedResult> {
    let path = runtime_dir.join(name);
    if path.is_file() {
        return Ok(SeedResult::Existing { path });
    }
    std::fs::create_dir_all(runtime_dir)
        .with_context(|| format!("create runtime folder {}", runtime_dir.display()))?;
    for dir in sources {
        let candidate = dir.join(name);
        if candidate.is_file() {
            std::fs::copy(&candidate, &path).with_context(|| {
                format!("copy {} to {}", candidate.display(), path.display())
            })?;
            tracing::info!(from = %candidate.display(), to = %path.display(), "seeded dataset file");
            return Ok(SeedResult::Copied {
                path,
                from: candidate,
            });
        }
    }
    bail!("missing {name} in {}", runtime_dir.display())
}

/// Resolved locations of every file the overlay reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimePaths {
    pub dir: PathBuf,
    pub poi_data: PathBuf,
    pub style_data: PathBuf,
    pub config: PathBuf,
    pub log: PathBuf,
}

impl RuntimePaths {
    /// Seed both dataset files into `dir`. Either one missing is fatal.
    pub fn prepare(dir: PathBuf, sources: &[PathBuf]) -> Result<Self> {
        let poi_data = ensure_user_file(&dir, POI_DATA_FILE, sources)?.path().to_path_buf();
        let style_data = ensure_user_file(&dir, STYLE_DATA_FILE, sources)?.path().to_path_buf();
        Ok(Self {
            config: dir.join(CONFIG_FILE),
            log: dir.join(LOG_FILE),
            poi_data,
            style_data,
            dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_from_first_source_and_then_reuses() {
        let runtime = tempfile::tempdir().expect("runtime dir");
        let bundle = tempfile::tempdir().expect("bundle dir");
        let fallback = tempfile::tempdir().expect("fallback dir");
        std::fs::write(bundle.path().join(POI_DATA_FILE), "bundled").expect("write bundle");
        std::fs::write(fallback.path().join(POI_DATA_FILE), "fallback").expect("write fallback");
        let sources = vec![bundle.path().to_path_buf(), fallback.path().to_path_buf()];

        let target = runtime.path().join("nested");
        let seeded = ensure_user_file(&target, POI_DATA_FILE, &sources).expect("seed");
        let path = match seeded {
            SeedResult::Copied { path, from } => {
                assert_eq!(from, bundle.path().join(POI_DATA_FILE));
                path
            }
            SeedResult::Existing { .. } => panic!("expected copy"),
        };
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "bundled");

        std::fs::write(&path, "edited").expect("edit");
        let again = ensure_user_file(&target, POI_DATA_FILE, &sources).expect("reuse");
        assert!(matches!(again, SeedResult::Existing { .. }));
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "edited");
    }

    #[test]
    fn missing_everywhere_is_an_error() {
        let runtime = tempfile::tempdir().expect("runtime dir");
        let err = ensure_user_file(runtime.path(), STYLE_DATA_FILE, &[]).err().expect("error");
        assert!(err.to_string().contains("missing poiData.json"));
    }

    #[test]
    fn prepare_requires_both_datasets() {
        let runtime = tempfile::tempdir().expect("runtime dir");
        let bundle = tempfile::tempdir().expect("bundle dir");
        std::fs::write(bundle.path().join(POI_DATA_FILE), "{}").expect("write poi");
        let sources = vec![bundle.path().to_path_buf()];
        assert!(RuntimePaths::prepare(runtime.path().to_path_buf(), &sources).is_err());

        std::fs::write(bundle.path().join(STYLE_DATA_FILE), "{}").expect("write style");
        let paths = RuntimePaths::prepare(runtime.path().to_path_buf(), &sources).expect("paths");
        assert_eq!(paths.config, runtime.path().join(CONFIG_FILE));
        assert_eq!(paths.log, runtime.path().join(LOG_FILE));
        assert!(paths.style_data.is_file());
    }

    #[test]
    fn runtime_dir_ends_with_app_name() {
        assert!(runtime_dir().ends_with(APP_DIR_NAME));
    }
}
