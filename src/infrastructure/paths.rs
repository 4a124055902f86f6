//! Path helpers for trace output.
//!
//! Resolves the per-user data directory used for trace files and expands `~` in
//! configured paths.

use std::env;
use std::path::{Path, PathBuf};

/// Name of the directory created under the user data directory.
const APP_DIR: &str = "typeahead";

/// Returns the data directory for typeahead output.
///
/// Resolution order: `$XDG_DATA_HOME/typeahead`, then
/// `$HOME/.local/share/typeahead`, then a `typeahead` directory under the
/// system temporary directory.
#[must_use]
pub fn data_dir() -> PathBuf {
    env::var_os("XDG_DATA_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| home_dir().map(|home| home.join(".local").join("share")))
        .unwrap_or_else(env::temp_dir)
        .join(APP_DIR)
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Expands a leading `~` to the user's home directory.
///
/// Paths without a leading `~`, and all paths when no home directory is known,
/// are returned unchanged.
#[must_use]
pub fn expand_tilde(path: &str) -> PathBuf {
    expand_tilde_with(path, home_dir().as_deref())
}

fn expand_tilde_with(path: &str, home: Option<&Path>) -> PathBuf {
    match (path, home) {
        ("~", Some(home)) => home.to_path_buf(),
        (_, Some(home)) if path.starts_with("~/") => home.join(&path[2..]),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_leading_tilde_only() {
        let home = Path::new("/home/ada");

        assert_eq!(expand_tilde_with("~", Some(home)), PathBuf::from("/home/ada"));
        assert_eq!(
            expand_tilde_with("~/traces/out.json", Some(home)),
            PathBuf::from("/home/ada/traces/out.json")
        );
        assert_eq!(expand_tilde_with("/var/log/x", Some(home)), PathBuf::from("/var/log/x"));
        assert_eq!(expand_tilde_with("a/~/b", Some(home)), PathBuf::from("a/~/b"));
    }

    #[test]
    fn leaves_tilde_without_home() {
        assert_eq!(expand_tilde_with("~/x", None), PathBuf::from("~/x"));
    }

    #[test]
    fn data_dir_ends_with_app_dir() {
        assert!(data_dir().ends_with(APP_DIR));
    }
}
