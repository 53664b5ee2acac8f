use crate::config::ScanRule;
use crate::fs::Filesystem;
use std::io;
use std::path::{Component, Path, PathBuf};

pub struct FileWalker<'a, F: Filesystem + ?Sized> {
    fs: &'a F,
    /// Allowed suffixes with a leading dot, longest first
    extensions: Vec<String>,
    /// Exclude patterns split into path segments
    exclude: Vec<Vec<String>>,
}

impl<'a, F: Filesystem + ?Sized> FileWalker<'a, F> {
    pub fn new(fs: &'a F, rule: &ScanRule) -> Self {
        let mut extensions: Vec<String> = rule
            .extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.'))
            .filter(|ext| !ext.is_empty())
            .map(|ext| format!(".{}", ext))
            .collect();
        // "blade.php" must be tried before "php"
        extensions.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        extensions.dedup();

        let exclude = rule
            .exclude
            .iter()
            .map(|pattern| {
                pattern
                    .split(['/', '\\'])
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|segments| !segments.is_empty())
            .collect();

        Self {
            fs,
            extensions,
            exclude,
        }
    }

    /// Candidate files under `root`.
    ///
    /// Listing happens up front; extension filtering is applied lazily as the
    /// iterator is consumed. Each call starts a fresh walk.
    pub fn walk(&self, root: &Path) -> io::Result<impl Iterator<Item = PathBuf> + '_> {
        let skip_dir = |relative: &Path| self.is_excluded_dir(relative);
        let files = self.fs.list_files_recursive(root, &skip_dir)?;
        let root = root.to_path_buf();

        Ok(files.into_iter().filter(move |path| {
            // A file is also dropped if its parent directories match, in case the
            // filesystem listed it without consulting `skip_dir`.
            let in_excluded_dir = path
                .strip_prefix(&root)
                .ok()
                .and_then(Path::parent)
                .is_some_and(|dir| self.is_excluded_dir(dir));
            !in_excluded_dir && self.matching_extension(path).is_some()
        }))
    }

    /// The configured extension this file name ends with, if any.
    pub fn matching_extension(&self, path: &Path) -> Option<&str> {
        let name = path.file_name()?.to_str()?;
        self.extensions
            .iter()
            .find(|ext| name.len() > ext.len() && name.ends_with(ext.as_str()))
            .map(|ext| &ext[1..])
    }

    /// True when any exclude pattern matches whole segments of `relative`.
    pub fn is_excluded_dir(&self, relative: &Path) -> bool {
        let segments: Vec<&str> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => s.to_str(),
                _ => None,
            })
            .collect();

        self.exclude.iter().any(|pattern| {
            segments.len() >= pattern.len()
                && segments
                    .windows(pattern.len())
                    .any(|window| window.iter().zip(pattern).all(|(a, b)| *a == b.as_str()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::LocalFs;
    use tempfile::TempDir;

    fn rule(extensions: &[&str], exclude: &[&str]) -> ScanRule {
        ScanRule {
            paths: Vec::new(),
            functions: Vec::new(),
            extensions: extensions.iter().map(|s| s.to_string()).collect(),
            exclude: exclude.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "").unwrap();
    }

    fn walk_relative(root: &Path, rule: &ScanRule) -> Vec<String> {
        let walker = FileWalker::new(&LocalFs, rule);
        walker
            .walk(root)
            .unwrap()
            .map(|p| {
                p.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    // ==================== Extension Matching ====================

    #[test]
    fn test_compound_extension_checked_first() {
        let r = rule(&["php", "blade.php"], &[]);
        let walker = FileWalker::new(&LocalFs, &r);

        assert_eq!(
            walker.matching_extension(Path::new("welcome.blade.php")),
            Some("blade.php")
        );
        assert_eq!(walker.matching_extension(Path::new("index.php")), Some("php"));
        assert_eq!(walker.matching_extension(Path::new("app.js")), None);
    }

    #[test]
    fn test_extension_requires_dot() {
        let r = rule(&["php"], &[]);
        let walker = FileWalker::new(&LocalFs, &r);

        assert_eq!(walker.matching_extension(Path::new("notphp")), None);
        assert_eq!(walker.matching_extension(Path::new(".php")), None);
    }

    #[test]
    fn test_extension_leading_dot_in_config_is_tolerated() {
        let r = rule(&[".vue"], &[]);
        let walker = FileWalker::new(&LocalFs, &r);
        assert_eq!(walker.matching_extension(Path::new("App.vue")), Some("vue"));
    }

    // ==================== Directory Exclusion ====================

    #[test]
    fn test_exclusion_is_segment_based() {
        let r = rule(&["php"], &["vendor", "resources/cache"]);
        let walker = FileWalker::new(&LocalFs, &r);

        assert!(walker.is_excluded_dir(Path::new("vendor")));
        assert!(walker.is_excluded_dir(Path::new("admin/vendor/x")));
        assert!(walker.is_excluded_dir(Path::new("a/resources/cache")));
        assert!(!walker.is_excluded_dir(Path::new("vendors")));
        assert!(!walker.is_excluded_dir(Path::new("my-vendor")));
        assert!(!walker.is_excluded_dir(Path::new("resources")));
        assert!(!walker.is_excluded_dir(Path::new("cache")));
    }

    #[test]
    fn test_walk_skips_excluded_directories_only() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "home.blade.php");
        touch(temp.path(), "vendor-report.php");
        touch(temp.path(), "vendor/package/view.php");
        touch(temp.path(), "admin/vendor/view.php");
        touch(temp.path(), "admin/users.php");
        touch(temp.path(), "admin/app.js");

        let files = walk_relative(temp.path(), &rule(&["php", "blade.php"], &["vendor"]));

        assert_eq!(
            files,
            vec!["admin/users.php", "home.blade.php", "vendor-report.php"]
        );
    }

    #[test]
    fn test_walk_is_reinvokable() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "a.php");
        let r = rule(&["php"], &[]);
        let walker = FileWalker::new(&LocalFs, &r);

        assert_eq!(walker.walk(temp.path()).unwrap().count(), 1);
        assert_eq!(walker.walk(temp.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_walk_missing_root_is_error() {
        let temp = TempDir::new().unwrap();
        let r = rule(&["php"], &[]);
        let walker = FileWalker::new(&LocalFs, &r);
        assert!(walker.walk(&temp.path().join("missing")).is_err());
    }
}
