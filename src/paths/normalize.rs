// src/paths/normalize.rs

//! Lexical path helpers shared by config resolution, mapping and the watcher.

use std::path::{Component, Path, PathBuf};

/// Lexically normalize a path: drop `.` segments and fold `..` into the
/// preceding segment. The filesystem is never consulted, so symlinks are
/// left untouched.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `/..` is `/`.
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }

    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}

/// Resolve `path` against `base` unless it is already absolute, then normalize.
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_path(path)
    } else {
        normalize_path(&base.join(path))
    }
}

/// Render a path with forward slashes regardless of platform.
pub fn slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Relative path from the directory `from_dir` to `to`, with forward slashes.
///
/// Both inputs are normalized first. Returns an empty string when they are
/// the same path, and `to` unchanged when no relative form exists (an
/// absolute `to` against a relative `from_dir` on another prefix).
pub fn relative_path(from_dir: &Path, to: &Path) -> String {
    let to = normalize_path(to);
    match pathdiff::diff_paths(&to, normalize_path(from_dir)) {
        Some(relative) => slash(&relative),
        None => slash(&to),
    }
}
