//! Encoder options for the TIFF writer.

use tiff::encoder::Compression;
use tiff::encoder::compression::DeflateLevel;
use tiff::tags::Predictor;

/// Compression applied to each frame's strips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TiffCompression {
    #[default]
    None,
    Lzw,
    DeflateFast,
    DeflateBalanced,
    DeflateBest,
}

impl TiffCompression {
    pub(crate) fn encoder_setting(self) -> Compression {
        match self {
            TiffCompression::None => Compression::Uncompressed,
            TiffCompression::Lzw => Compression::Lzw,
            TiffCompression::DeflateFast => Compression::Deflate(DeflateLevel::Fast),
            TiffCompression::DeflateBalanced => Compression::Deflate(DeflateLevel::Balanced),
            TiffCompression::DeflateBest => Compression::Deflate(DeflateLevel::Best),
        }
    }
}

/// Sample differencing done before compression. Only helps the LZW and Deflate modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TiffPredictor {
    #[default]
    None,
    /// Each sample is stored as the difference from its left neighbour.
    Horizontal,
}

impl TiffPredictor {
    pub(crate) fn encoder_setting(self) -> Option<Predictor> {
        match self {
            TiffPredictor::None => None,
            TiffPredictor::Horizontal => Some(Predictor::Horizontal),
        }
    }
}

/// How `TiffImageWriter` encodes frames. The default writes uncompressed strips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriterConfig {
    pub compression: TiffCompression,
    pub predictor: TiffPredictor,
}

impl WriterConfig {
    pub fn builder() -> WriterConfigBuilder {
        WriterConfigBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct WriterConfigBuilder {
    config: WriterConfig,
}

impl WriterConfigBuilder {
    pub fn compression(mut self, compression: TiffCompression) -> Self {
        self.config.compression = compression;
        self
    }

    pub fn predictor(mut self, predictor: TiffPredictor) -> Self {
        self.config.predictor = predictor;
        self
    }

    pub fn build(self) -> WriterConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_uncompressed() {
        let config = WriterConfig::builder().build();
        assert!(matches!(
            config.compression.encoder_setting(),
            Compression::Uncompressed
        ));
        assert_eq!(config.predictor.encoder_setting(), None);
    }

    #[test]
    fn test_horizontal_maps_to_tag() {
        assert_eq!(
            TiffPredictor::Horizontal.encoder_setting(),
            Some(Predictor::Horizontal)
        );
    }
}
