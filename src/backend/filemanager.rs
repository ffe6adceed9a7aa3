use std::path::Path;
use std::path::PathBuf;
use std::fs::create_dir_all;

use directories::ProjectDirs;

use crate::backend::error::LyricbarError;

#[derive(Clone, Debug)]
pub struct DataDir {
    root: PathBuf
}

impl DataDir {
    pub fn create_or_load() -> Result<Self, LyricbarError> {
        let root = match ProjectDirs::from("com", "lyricbar", "Lyricbar") {
            Some(dir_builder) => dir_builder.data_dir().to_path_buf(),
            None => return Err(LyricbarError::UnrecognisedHomeDir)
        };
        Self::at(root)
    }

    /// Use an explicit directory, creating it if needed.
    pub fn at(root: PathBuf) -> Result<Self, LyricbarError> {
        if let Err(e) = create_dir_all(&root) {
            return Err(LyricbarError::DirectoryNotFound(format!("{root:?}: {e}")));
        }
        Ok(Self { root })
    }

    pub fn get_root_ref(&self) -> &Path { self.root.as_path() }
}
