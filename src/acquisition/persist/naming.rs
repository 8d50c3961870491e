use std::path::{Path, PathBuf};

use crate::acquisition::common::error::Result;

/// Output location and index-formatted file names for one run, e.g. `frames/image_003.tiff`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingScheme {
    directory: PathBuf,
    prefix: String,
    digits: usize,
}

impl NamingScheme {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            prefix: "image_".to_string(),
            digits: 3,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Minimum zero-padded width of the index.
    pub fn with_digits(mut self, digits: usize) -> Self {
        self.digits = digits;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn file_name(&self, index: usize, extension: &str) -> String {
        format!(
            "{}{:0width$}.{}",
            self.prefix,
            index,
            extension,
            width = self.digits
        )
    }

    pub fn path_for(&self, index: usize, extension: &str) -> PathBuf {
        self.directory.join(self.file_name(index, extension))
    }

    /// Creates the output directory if it does not exist yet.
    pub fn prepare(&self) -> Result<()> {
        std::fs::create_dir_all(&self.directory)?;
        Ok(())
    }
}
