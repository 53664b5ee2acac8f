use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

pub trait Filesystem {
    fn is_directory(&self, path: &Path) -> bool;

    fn exists(&self, path: &Path) -> bool;

    /// List every regular file under `root`, in a stable order.
    ///
    /// `skip_dir` receives each directory path relative to `root`; returning
    /// `true` prunes that directory and everything beneath it.
    fn list_files_recursive(
        &self,
        root: &Path,
        skip_dir: &dyn Fn(&Path) -> bool,
    ) -> io::Result<Vec<PathBuf>>;

    fn read_file(&self, path: &Path) -> io::Result<String>;

    fn write_file(&self, path: &Path, contents: &str) -> io::Result<()>;

    /// Create `path` and any missing parents.
    fn make_directory(&self, path: &Path) -> io::Result<()>;
}

/// Disk-backed filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl Filesystem for LocalFs {
    fn is_directory(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn list_files_recursive(
        &self,
        root: &Path,
        skip_dir: &dyn Fn(&Path) -> bool,
    ) -> io::Result<Vec<PathBuf>> {
        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not a directory", root.display()),
            ));
        }

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                if entry.depth() == 0 || !entry.file_type().is_dir() {
                    return true;
                }
                match entry.path().strip_prefix(root) {
                    Ok(relative) => !skip_dir(relative),
                    Err(_) => true,
                }
            });

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Cannot access path under {}: {}", root.display(), e);
                    continue;
                }
            };
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }

        Ok(files)
    }

    fn read_file(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write_file(&self, path: &Path, contents: &str) -> io::Result<()> {
        std::fs::write(path, contents)
    }

    fn make_directory(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }
}
