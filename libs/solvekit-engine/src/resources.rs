// Temporary resource tracking for a single run
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Scope guard over every temporary file or directory created during a run.
///
/// Paths are appended while the run progresses and removed exactly once,
/// either through [`ResourceGuard::cleanup`] or, if that never happened, when
/// the guard is dropped (early `?` return, panic, cancelled future).
#[derive(Debug, Default)]
pub struct ResourceGuard {
    paths: Vec<PathBuf>,
    drained: bool,
}

impl ResourceGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        debug!(path = %path.display(), "Tracking temporary resource");
        self.paths.push(path);
    }

    pub fn tracked(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn is_drained(&self) -> bool {
        self.drained
    }

    /// Remove every tracked resource and return how many existed
    pub fn cleanup(&mut self) -> usize {
        if self.drained {
            return 0;
        }
        self.drained = true;

        let mut removed = 0;
        for path in self.paths.drain(..) {
            match remove_path(&path) {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove temporary resource"),
            }
        }
        debug!(removed, "Temporary resources cleaned");
        removed
    }
}

impl Drop for ResourceGuard {
    fn drop(&mut self) {
        self.cleanup();
    }
}

fn remove_path(path: &Path) -> io::Result<bool> {
    let metadata = match std::fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    if metadata.is_dir() {
        std::fs::remove_dir_all(path)?;
    } else {
        std::fs::remove_file(path)?;
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_removes_files_and_dirs() {
        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("artifact");
        let dir = root.path().join("classes");
        std::fs::write(&file, b"bin").unwrap();
        std::fs::create_dir_all(dir.join("nested")).unwrap();
        std::fs::write(dir.join("nested/Main.class"), b"class").unwrap();

        let mut guard = ResourceGuard::new();
        guard.track(&file);
        guard.track(&dir);
        guard.track(root.path().join("never-created"));

        assert_eq!(guard.cleanup(), 2);
        assert!(!file.exists());
        assert!(!dir.exists());
        assert!(guard.is_drained());
        assert_eq!(guard.cleanup(), 0);
    }

    #[test]
    fn test_drop_cleans_up() {
        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("artifact");
        std::fs::write(&file, b"bin").unwrap();
        {
            let mut guard = ResourceGuard::new();
            guard.track(&file);
        }
        assert!(!file.exists());
    }

    #[test]
    fn test_cleanup_on_early_return() {
        fn failing_step(guard: &mut ResourceGuard, path: &Path) -> Result<(), String> {
            std::fs::write(path, b"partial").map_err(|e| e.to_string())?;
            guard.track(path);
            Err("compile failed".to_string())
        }

        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("partial");
        let result = (|| {
            let mut guard = ResourceGuard::new();
            failing_step(&mut guard, &file)?;
            Ok::<(), String>(())
        })();
        assert!(result.is_err());
        assert!(!file.exists());
    }
}
