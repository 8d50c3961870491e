use std::io::Write;

use tiff::encoder::TiffEncoder;
use tiff::encoder::colortype::{Gray8, Gray16, RGB8};
use tracing::debug;

use crate::acquisition::common::error::{CameraError, Result};
use crate::acquisition::driver::{Image, PixelFormat};
use crate::acquisition::persist::options::WriterConfig;
use crate::acquisition::persist::writer::ImageWriter;

#[derive(Debug, Clone, Default)]
pub struct TiffImageWriter {
    config: WriterConfig,
}

impl TiffImageWriter {
    pub fn new(config: WriterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }
}

/// Drops row padding so the encoder sees tightly packed pixels.
fn packed_rows(image: &Image, bytes_per_pixel: usize) -> Result<Vec<u8>> {
    let row_bytes = image.cols as usize * bytes_per_pixel;
    let stride = (image.stride as usize).max(row_bytes);
    let needed = stride * (image.rows as usize).saturating_sub(1) + row_bytes;
    if image.rows == 0 || image.cols == 0 || image.data.len() < needed {
        return Err(CameraError::Encode(format!(
            "{}x{} image with stride {} does not fit in {} bytes",
            image.cols,
            image.rows,
            image.stride,
            image.data.len()
        )));
    }
    if stride == row_bytes {
        return Ok(image.data[..needed].to_vec());
    }
    Ok(image
        .data
        .chunks(stride)
        .take(image.rows as usize)
        .flat_map(|row| &row[..row_bytes])
        .copied()
        .collect())
}

impl ImageWriter for TiffImageWriter {
    fn extension(&self) -> &str {
        "tiff"
    }

    fn write_image(&self, image: &Image, output: &mut dyn Write) -> Result<()> {
        debug!(
            "Encoding TIFF image: {}x{} {:?}",
            image.cols, image.rows, image.pixel_format
        );

        let mut buffer = Vec::new();
        let encode_err = |e: tiff::TiffError| CameraError::Encode(e.to_string());

        let mut encoder = TiffEncoder::new(std::io::Cursor::new(&mut buffer))
            .map_err(encode_err)?
            .with_compression(self.config.compression.encoder_setting());
        if let Some(predictor) = self.config.predictor.encoder_setting() {
            encoder = encoder.with_predictor(predictor);
        }

        match image.pixel_format {
            PixelFormat::Bgr => {
                let rgb: Vec<u8> = packed_rows(image, 3)?
                    .chunks_exact(3)
                    .flat_map(|px| [px[2], px[1], px[0]])
                    .collect();
                encoder
                    .write_image::<RGB8>(image.cols, image.rows, &rgb)
                    .map_err(encode_err)?;
            }
            PixelFormat::Rgb8 => {
                encoder
                    .write_image::<RGB8>(image.cols, image.rows, &packed_rows(image, 3)?)
                    .map_err(encode_err)?;
            }
            PixelFormat::Mono8 | PixelFormat::Raw8 => {
                encoder
                    .write_image::<Gray8>(image.cols, image.rows, &packed_rows(image, 1)?)
                    .map_err(encode_err)?;
            }
            PixelFormat::Mono16 | PixelFormat::Raw16 => {
                let samples: Vec<u16> = packed_rows(image, 2)?
                    .chunks_exact(2)
                    .map(|b| u16::from_le_bytes([b[0], b[1]]))
                    .collect();
                encoder
                    .write_image::<Gray16>(image.cols, image.rows, &samples)
                    .map_err(encode_err)?;
            }
            other => {
                return Err(CameraError::Encode(format!(
                    "no TIFF layout for pixel format {other:?}"
                )));
            }
        }

        output.write_all(&buffer)?;

        debug!("TIFF encoding complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use tiff::decoder::{Decoder, DecodingResult};
    use tiff::tags::Tag;

    use super::*;
    use crate::acquisition::driver::BayerTileFormat;
    use crate::acquisition::persist::options::{TiffCompression, TiffPredictor};

    fn bgr_image() -> Image {
        Image {
            rows: 2,
            cols: 2,
            stride: 6,
            pixel_format: PixelFormat::Bgr,
            bayer_format: BayerTileFormat::None,
            data: vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12],
        }
    }

    #[test]
    fn test_bgr_written_as_rgb() {
        let writer = TiffImageWriter::default();
        let mut output = Vec::new();
        writer.write_image(&bgr_image(), &mut output).unwrap();

        let mut decoder = Decoder::new(Cursor::new(output)).unwrap();
        assert_eq!(decoder.dimensions().unwrap(), (2, 2));
        match decoder.read_image().unwrap() {
            DecodingResult::U8(data) => {
                assert_eq!(&data[..6], &[3, 2, 1, 6, 5, 4]);
            }
            _ => panic!("expected 8-bit samples"),
        }
    }

    #[test]
    fn test_deflate_with_predictor() {
        let config = WriterConfig::builder()
            .compression(TiffCompression::DeflateBalanced)
            .predictor(TiffPredictor::Horizontal)
            .build();
        let writer = TiffImageWriter::new(config);
        let mut output = Vec::new();
        writer.write_image(&bgr_image(), &mut output).unwrap();

        let mut decoder = Decoder::new(Cursor::new(output)).unwrap();
        assert_eq!(decoder.get_tag_u32(Tag::Predictor).unwrap(), 2);
        match decoder.read_image().unwrap() {
            DecodingResult::U8(data) => {
                assert_eq!(data, vec![3, 2, 1, 6, 5, 4, 9, 8, 7, 12, 11, 10]);
            }
            _ => panic!("expected 8-bit samples"),
        }
    }

    #[test]
    fn test_predictor_off_by_default() {
        let writer = TiffImageWriter::new(
            WriterConfig::builder()
                .compression(TiffCompression::Lzw)
                .build(),
        );
        let mut output = Vec::new();
        writer.write_image(&bgr_image(), &mut output).unwrap();

        let mut decoder = Decoder::new(Cursor::new(output)).unwrap();
        assert_eq!(decoder.get_tag_u32(Tag::Predictor).unwrap(), 1);
    }

    #[test]
    fn test_padded_rows_are_packed() {
        let image = Image {
            rows: 2,
            cols: 2,
            stride: 4,
            pixel_format: PixelFormat::Mono8,
            bayer_format: BayerTileFormat::None,
            data: vec![1, 2, 0, 0, 3, 4, 0, 0],
        };
        assert_eq!(packed_rows(&image, 1).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_short_buffer_rejected() {
        let mut image = bgr_image();
        image.data.truncate(5);
        let result = TiffImageWriter::default().write_image(&image, &mut Vec::new());
        assert!(matches!(result, Err(CameraError::Encode(_))));
    }

    #[test]
    fn test_unsupported_format() {
        let mut image = bgr_image();
        image.pixel_format = PixelFormat::Yuv422;
        let result = TiffImageWriter::default().write_image(&image, &mut Vec::new());
        assert!(matches!(result, Err(CameraError::Encode(_))));
    }
}
