//! Persistence module
//!
//! This module writes converted frames to disk and produces the structured record of a run.

mod naming;
mod options;
mod record;
mod tiff_writer;
mod writer;

pub use naming::NamingScheme;
pub use record::AcquisitionRecord;
pub use tiff_writer::TiffImageWriter;
pub use options::{TiffCompression, TiffPredictor, WriterConfig, WriterConfigBuilder};
pub use writer::ImageWriter;
