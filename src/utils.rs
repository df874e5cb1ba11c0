use std::{
    ffi::OsStr,
    io,
    path::{Path, PathBuf},
};

use walkdir::WalkDir;

pub fn mkdir(dir: &Path) -> io::Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// Whether `name` ends in one of `extensions` (given with the leading dot, case-sensitive).
pub fn has_extension(name: &str, extensions: &[String]) -> bool {
    match Path::new(name).extension().and_then(OsStr::to_str) {
        Some(ext) => extensions
            .iter()
            .any(|e| e.strip_prefix('.').unwrap_or(e) == ext),
        None => false,
    }
}

/// Names of the regular files directly inside `folder` with a recognized extension, sorted.
pub fn video_files(folder: &Path, extensions: &[String]) -> io::Result<Vec<String>> {
    let mut files = list_dir(folder)?;
    files.retain(|f| has_extension(f, extensions) && folder.join(f).is_file());
    Ok(files)
}

/// Sorted names of all entries directly inside `folder`.
pub fn list_dir(folder: &Path) -> io::Result<Vec<String>> {
    let mut names = folder
        .read_dir()?
        .map(|r| r.map(|d| d.file_name().to_string_lossy().into_owned()))
        .collect::<io::Result<Vec<String>>>()?;
    names.sort();
    Ok(names)
}

/// Full paths of the equalized clips among `files`: the name carries `marker`
/// and ends with a recognized extension.
pub fn target_files(
    folder: &Path,
    files: &[String],
    marker: &str,
    extensions: &[String],
) -> Vec<PathBuf> {
    files
        .iter()
        .filter(|f| f.contains(marker) && extensions.iter().any(|e| f.ends_with(e.as_str())))
        .map(|f| folder.join(f))
        .collect()
}

/// Replace ASCII and ideographic spaces in file names under `dir` (recursive).
/// Returns the `(old, new)` pairs.
pub fn rename_files_with_spaces(dir: &Path) -> io::Result<Vec<(PathBuf, PathBuf)>> {
    let to_rename = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let name = e.file_name().to_string_lossy();
            if name.contains([' ', '\u{3000}']) {
                let new_name = name.replace([' ', '\u{3000}'], "_");
                Some((e.path().to_owned(), e.path().with_file_name(new_name)))
            } else {
                None
            }
        })
        .collect::<Vec<_>>();

    for (old_path, new_path) in &to_rename {
        std::fs::rename(old_path, new_path)?;
        println!("Renamed: {} to {}", old_path.display(), new_path.display());
    }
    Ok(to_rename)
}

/// Remove regular files in `folder` whose name contains any of `markers`.
pub fn delete_intermediates(folder: &Path, markers: &[String]) -> io::Result<Vec<PathBuf>> {
    let mut deleted = Vec::new();
    for name in list_dir(folder)? {
        if !markers.iter().any(|m| name.contains(m.as_str())) {
            continue;
        }
        let path = folder.join(&name);
        if path.is_file() {
            std::fs::remove_file(&path)?;
            deleted.push(path);
        }
    }
    Ok(deleted)
}
