//! Location of the bundled model artifact.

use super::ModelLoadError;
use std::path::{Path, PathBuf};

/// File name of the bundled gesture model.
pub const MODEL_FILE_NAME: &str = "c_gesture.onnx";

/// Where to load the model from.
#[derive(Debug, Clone)]
pub enum ModelSource {
    /// A file on disk.
    File(PathBuf),
    /// Bytes already in memory.
    Memory(Vec<u8>),
}

impl ModelSource {
    /// The bundled artifact inside `asset_dir`.
    pub fn bundled(asset_dir: impl AsRef<Path>) -> Self {
        Self::File(asset_dir.as_ref().join(MODEL_FILE_NAME))
    }

    /// Reads the artifact, failing on a missing or empty file.
    pub fn read(&self) -> Result<Vec<u8>, ModelLoadError> {
        let bytes = match self {
            Self::File(path) => {
                if !path.is_file() {
                    return Err(ModelLoadError::NotFound(path.display().to_string()));
                }
                std::fs::read(path).map_err(|source| ModelLoadError::Read {
                    path: path.display().to_string(),
                    source,
                })?
            }
            Self::Memory(bytes) => bytes.clone(),
        };

        if bytes.is_empty() {
            return Err(ModelLoadError::Invalid(format!("{} is empty", self.describe())));
        }
        Ok(bytes)
    }

    /// Human-readable origin.
    pub fn describe(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Memory(bytes) => format!("<{} bytes in memory>", bytes.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_path() {
        match ModelSource::bundled("assets") {
            ModelSource::File(path) => assert_eq!(path, Path::new("assets/c_gesture.onnx")),
            other => panic!("unexpected source {other:?}"),
        }
    }

    #[test]
    fn test_missing_file() {
        let source = ModelSource::bundled("/nonexistent/gesture-launch");
        assert!(matches!(source.read(), Err(ModelLoadError::NotFound(_))));
    }

    #[test]
    fn test_empty_memory_is_invalid() {
        assert!(matches!(
            ModelSource::Memory(Vec::new()).read(),
            Err(ModelLoadError::Invalid(_))
        ));
        assert_eq!(ModelSource::Memory(vec![1, 2]).read().unwrap(), vec![1, 2]);
    }
}
