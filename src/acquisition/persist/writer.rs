use std::io::Write;

use crate::acquisition::common::error::Result;
use crate::acquisition::driver::Image;

/// Persistence collaborator: encodes one converted frame into `output`.
pub trait ImageWriter {
    /// File extension for the names this writer produces, without the dot.
    fn extension(&self) -> &str;
    fn write_image(&self, image: &Image, output: &mut dyn Write) -> Result<()>;
}
