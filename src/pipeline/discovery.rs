use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{BatchError, Result};

/// Source videos in `directory` with one of `extensions` (case-insensitive)
///
/// Hidden files and subdirectories are skipped. Results are sorted so runs
/// are reproducible.
pub fn discover_inputs<P: AsRef<Path>>(directory: P, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let directory = directory.as_ref();
    info!("Looking for videos in folder: {}", directory.display());

    if !directory.is_dir() {
        return Err(BatchError::InputDirMissing {
            path: directory.display().to_string(),
        }
        .into());
    }

    let mut inputs = Vec::new();
    for entry in std::fs::read_dir(directory)? {
        let path = entry?.path();
        if path.is_file() && !is_hidden_file(&path) && has_extension(&path, extensions) {
            inputs.push(path);
        } else {
            debug!("Skipping {}", path.display());
        }
    }
    inputs.sort();

    if inputs.is_empty() {
        warn!("No video files found in '{}'", directory.display());
    } else {
        info!("Found {} video files:", inputs.len());
        for path in &inputs {
            info!(" - {}", path.display());
        }
    }

    Ok(inputs)
}

/// `<output_dir>/<stem>_clip_<index>.<container>`, `index` is 1-based
pub fn clip_output_path(output_dir: &Path, input: &Path, index: usize, container: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    output_dir.join(format!("{}_clip_{}.{}", stem, index, container))
}

/// For each input, the earlier input whose clip names it would reuse
///
/// Clip names come from the file stem only, so `a.mov` and `a.MP4` collide.
/// Stems are compared case-insensitively since output folders often live on
/// case-insensitive filesystems.
pub fn output_collisions(inputs: &[PathBuf]) -> Vec<Option<PathBuf>> {
    let mut owners: HashMap<String, &PathBuf> = HashMap::new();
    inputs
        .iter()
        .map(|input| {
            let stem = input
                .file_stem()
                .map(|s| s.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            match owners.get(&stem) {
                Some(&owner) => {
                    warn!("{} and {} share the clip name '{}'", owner.display(), input.display(), stem);
                    Some(owner.clone())
                }
                None => {
                    owners.insert(stem, input);
                    None
                }
            }
        })
        .collect()
}

/// Create the output folder if it does not exist yet
pub fn ensure_output_dir(output_dir: &Path) -> Result<()> {
    if !output_dir.exists() {
        debug!("Creating output folder: {}", output_dir.display());
    }
    std::fs::create_dir_all(output_dir).map_err(|e| {
        BatchError::OutputDirFailed {
            path: output_dir.display().to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

fn is_hidden_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn default_extensions() -> Vec<String> {
        vec!["mov".to_string(), "mp4".to_string()]
    }

    #[test]
    fn test_discovers_matching_extensions_case_insensitively() {
        let dir = tempdir().unwrap();
        for name in ["b.MOV", "a.mp4", "c.Mp4", "notes.txt", ".hidden.mov", "clip.mkv"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.mov")).unwrap();

        let found = discover_inputs(dir.path(), &default_extensions()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["a.mp4", "b.MOV", "c.Mp4"]);
    }

    #[test]
    fn test_missing_input_dir_is_an_error() {
        let dir = tempdir().unwrap();
        let result = discover_inputs(dir.path().join("Unedited"), &default_extensions());
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_input_dir_yields_nothing() {
        let dir = tempdir().unwrap();
        assert!(discover_inputs(dir.path(), &default_extensions()).unwrap().is_empty());
    }

    #[test]
    fn test_clip_output_path() {
        let path = clip_output_path(Path::new("Edited"), Path::new("Unedited/IMG_0042.MOV"), 3, "mp4");
        assert_eq!(path, Path::new("Edited/IMG_0042_clip_3.mp4"));
    }

    #[test]
    fn test_output_collisions_by_stem() {
        let inputs: Vec<PathBuf> = ["raw/a.MP4", "raw/a.mov", "raw/b.mov", "raw/A.mov"]
            .iter()
            .map(PathBuf::from)
            .collect();

        let claimed = output_collisions(&inputs);

        assert_eq!(
            claimed,
            vec![
                None,
                Some(PathBuf::from("raw/a.MP4")),
                None,
                Some(PathBuf::from("raw/a.MP4")),
            ]
        );
    }

    #[test]
    fn test_ensure_output_dir_creates_nested() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("Edited").join("reels");
        ensure_output_dir(&out).unwrap();
        assert!(out.is_dir());
        ensure_output_dir(&out).unwrap();
    }
}
