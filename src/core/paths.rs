use crate::core::catalog::SUPPORTED_INPUT_FORMATS;
use crate::core::error::ValidationError;
use std::path::{Path, PathBuf};

/// Lower-cased extension with its leading dot, or an empty string.
pub fn file_extension(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_ascii_lowercase()))
        .unwrap_or_default()
}

pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// `{out_dir}/{stem}{output_format}`. Only the file's own extension is
/// stripped; dots in parent directories are never touched. Two inputs with
/// the same stem map to the same output.
pub fn derive_output_path(input: &Path, out_dir: &Path, output_format: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    out_dir.join(format!("{}{}", stem, output_format))
}

pub async fn validate_input(path: &Path) -> Result<(), ValidationError> {
    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|_| ValidationError::MissingInput(path.to_path_buf()))?;
    if !meta.is_file() {
        return Err(ValidationError::NotAFile(path.to_path_buf()));
    }
    let ext = file_extension(path);
    if !SUPPORTED_INPUT_FORMATS.contains(&ext.as_str()) {
        return Err(ValidationError::UnsupportedInput { path: path.to_path_buf(), ext });
    }
    Ok(())
}

pub async fn validate_output_dir(dir: &Path) -> Result<(), ValidationError> {
    if dir.as_os_str().is_empty() {
        return Err(ValidationError::MissingOutputDir);
    }
    let meta = tokio::fs::metadata(dir)
        .await
        .map_err(|_| ValidationError::OutputDirNotFound(dir.to_path_buf()))?;
    if !meta.is_dir() {
        return Err(ValidationError::NotADirectory(dir.to_path_buf()));
    }
    Ok(())
}

/// Fail-fast check of a whole request; the first problem wins.
pub async fn validate_request(inputs: &[PathBuf], out_dir: &Path) -> Result<(), ValidationError> {
    if inputs.is_empty() {
        return Err(ValidationError::EmptyInput);
    }
    for input in inputs {
        validate_input(input).await?;
    }
    validate_output_dir(out_dir).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_replaces_extension() {
        assert_eq!(
            derive_output_path(Path::new("/a/video.mov"), Path::new("/out"), ".mp4"),
            PathBuf::from("/out/video.mp4")
        );
    }

    #[test]
    fn derive_ignores_dots_in_directories() {
        assert_eq!(
            derive_output_path(Path::new("/media/v1.2/clip"), Path::new("/out"), ".mkv"),
            PathBuf::from("/out/clip.mkv")
        );
        assert_eq!(
            derive_output_path(Path::new("/media/v1.2/my.clip.avi"), Path::new("/out"), ".mp4"),
            PathBuf::from("/out/my.clip.mp4")
        );
    }

    #[test]
    fn derive_collides_on_shared_stem() {
        let out = Path::new("/out");
        assert_eq!(
            derive_output_path(Path::new("/x/clip.mov"), out, ".mp4"),
            derive_output_path(Path::new("/y/clip.mkv"), out, ".mp4"),
        );
    }

    #[test]
    fn extension_is_case_insensitive() {
        assert_eq!(file_extension(Path::new("A.MOV")), ".mov");
        assert_eq!(file_extension(Path::new("noext")), "");
    }

    #[tokio::test]
    async fn validation_order_and_kinds() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("a.MP4");
        std::fs::write(&good, b"x").unwrap();
        let text = dir.path().join("notes.txt");
        std::fs::write(&text, b"x").unwrap();

        assert_eq!(validate_request(&[], dir.path()).await, Err(ValidationError::EmptyInput));
        assert!(validate_request(&[good.clone()], dir.path()).await.is_ok());

        assert!(matches!(
            validate_request(&[text], dir.path()).await,
            Err(ValidationError::UnsupportedInput { ext, .. }) if ext == ".txt"
        ));
        assert!(matches!(
            validate_request(&[dir.path().join("gone.mp4")], dir.path()).await,
            Err(ValidationError::MissingInput(_))
        ));
        assert!(matches!(
            validate_request(&[dir.path().to_path_buf()], dir.path()).await,
            Err(ValidationError::NotAFile(_))
        ));
        assert!(matches!(
            validate_request(&[good.clone()], &dir.path().join("missing")).await,
            Err(ValidationError::OutputDirNotFound(_))
        ));
        assert!(matches!(
            validate_request(&[good.clone()], &good).await,
            Err(ValidationError::NotADirectory(_))
        ));
        assert_eq!(validate_request(&[good], Path::new("")).await, Err(ValidationError::MissingOutputDir));
    }

    #[tokio::test]
    async fn first_bad_input_wins_over_a_bad_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.mov");
        assert_eq!(
            validate_request(&[missing.clone()], &dir.path().join("nowhere")).await,
            Err(ValidationError::MissingInput(missing))
        );
    }
}
