//! Compression family.  Compression runs on the serialized inner store
//! before encryption, and decompression right after decryption.

use std::io::{Read, Write};

use flate2::read::{DeflateDecoder, GzDecoder};
use flate2::write::{DeflateEncoder, GzEncoder};

use crate::errors::{Result, SecureLookupError, UnlockStage};

use super::properties::PropertyBag;
use super::registry::Algorithm;

/// Property key for the compression level used by every leveled codec.
pub const LEVEL: &str = "x";

pub trait Compression: Algorithm {
    fn default_properties(&self) -> Option<PropertyBag> {
        None
    }

    fn validate_properties(&self, props: &PropertyBag) -> Result<()>;

    fn is_properties_valid(&self, props: &PropertyBag) -> bool {
        self.validate_properties(props).is_ok()
    }

    fn compress(&self, input: &[u8], props: &PropertyBag) -> Result<Vec<u8>>;

    /// Failures are reported as an unlock failure at the decompression stage.
    fn decompress(&self, input: &[u8], props: &PropertyBag) -> Result<Vec<u8>>;
}

pub fn builtin() -> Vec<Box<dyn Compression>> {
    vec![
        Box::new(NoCompression),
        Box::new(Deflate),
        Box::new(GZip),
        Box::new(Zstd),
        Box::new(Lz4),
    ]
}

fn compress_error(algorithm: &str, e: impl std::fmt::Display) -> SecureLookupError {
    SecureLookupError::CompressionFailed(format!("{algorithm}: {e}"))
}

fn decompress_error(algorithm: &str, e: impl std::fmt::Display) -> SecureLookupError {
    SecureLookupError::unlock(UnlockStage::Decompression, format!("{algorithm}: {e}"))
}

/// Typed compression level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelProps {
    pub x: i32,
}

impl LevelProps {
    /// Read `x` from the bag, falling back to `default`, and bounds-check it.
    pub fn from_bag(
        algorithm: &str,
        props: &PropertyBag,
        default: i32,
        range: std::ops::RangeInclusive<i32>,
    ) -> Result<Self> {
        let x = if props.contains_key(LEVEL) {
            props.parse_required::<i32>(algorithm, LEVEL)?
        } else {
            default
        };
        if !range.contains(&x) {
            return Err(SecureLookupError::InvalidProperties {
                algorithm: algorithm.to_string(),
                reason: format!(
                    "level {LEVEL}={x} is outside {}..={}",
                    range.start(),
                    range.end()
                ),
            });
        }
        Ok(Self { x })
    }
}

fn level_bag(x: i32) -> Option<PropertyBag> {
    PropertyBag::from_pairs([(LEVEL, x.to_string())]).ok()
}

// ---------------------------------------------------------------------------
// Codecs
// ---------------------------------------------------------------------------

/// Pass-through.
pub struct NoCompression;

impl Algorithm for NoCompression {
    fn name(&self) -> &str {
        "None"
    }
}

impl Compression for NoCompression {
    fn validate_properties(&self, _props: &PropertyBag) -> Result<()> {
        Ok(())
    }

    fn compress(&self, input: &[u8], _props: &PropertyBag) -> Result<Vec<u8>> {
        Ok(input.to_vec())
    }

    fn decompress(&self, input: &[u8], _props: &PropertyBag) -> Result<Vec<u8>> {
        Ok(input.to_vec())
    }
}

pub struct Deflate;

impl Algorithm for Deflate {
    fn name(&self) -> &str {
        "Deflate"
    }
}

impl Compression for Deflate {
    fn default_properties(&self) -> Option<PropertyBag> {
        level_bag(9)
    }

    fn validate_properties(&self, props: &PropertyBag) -> Result<()> {
        LevelProps::from_bag(self.name(), props, 9, 0..=9).map(|_| ())
    }

    fn compress(&self, input: &[u8], props: &PropertyBag) -> Result<Vec<u8>> {
        let x = LevelProps::from_bag(self.name(), props, 9, 0..=9)?.x;
        let mut encoder = DeflateEncoder::new(Vec::new(), flate2::Compression::new(x as u32));
        encoder
            .write_all(input)
            .map_err(|e| compress_error(self.name(), e))?;
        encoder.finish().map_err(|e| compress_error(self.name(), e))
    }

    fn decompress(&self, input: &[u8], _props: &PropertyBag) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        DeflateDecoder::new(input)
            .read_to_end(&mut out)
            .map_err(|e| decompress_error(self.name(), e))?;
        Ok(out)
    }
}

pub struct GZip;

impl Algorithm for GZip {
    fn name(&self) -> &str {
        "GZip"
    }
}

impl Compression for GZip {
    fn default_properties(&self) -> Option<PropertyBag> {
        level_bag(9)
    }

    fn validate_properties(&self, props: &PropertyBag) -> Result<()> {
        LevelProps::from_bag(self.name(), props, 9, 0..=9).map(|_| ())
    }

    fn compress(&self, input: &[u8], props: &PropertyBag) -> Result<Vec<u8>> {
        let x = LevelProps::from_bag(self.name(), props, 9, 0..=9)?.x;
        let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::new(x as u32));
        encoder
            .write_all(input)
            .map_err(|e| compress_error(self.name(), e))?;
        encoder.finish().map_err(|e| compress_error(self.name(), e))
    }

    fn decompress(&self, input: &[u8], _props: &PropertyBag) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        GzDecoder::new(input)
            .read_to_end(&mut out)
            .map_err(|e| decompress_error(self.name(), e))?;
        Ok(out)
    }
}

pub struct Zstd;

impl Algorithm for Zstd {
    fn name(&self) -> &str {
        "Zstd"
    }
}

impl Compression for Zstd {
    fn default_properties(&self) -> Option<PropertyBag> {
        level_bag(19)
    }

    fn validate_properties(&self, props: &PropertyBag) -> Result<()> {
        LevelProps::from_bag(self.name(), props, 19, 1..=22).map(|_| ())
    }

    fn compress(&self, input: &[u8], props: &PropertyBag) -> Result<Vec<u8>> {
        let x = LevelProps::from_bag(self.name(), props, 19, 1..=22)?.x;
        zstd::stream::encode_all(input, x).map_err(|e| compress_error(self.name(), e))
    }

    fn decompress(&self, input: &[u8], _props: &PropertyBag) -> Result<Vec<u8>> {
        zstd::stream::decode_all(input).map_err(|e| decompress_error(self.name(), e))
    }
}

/// LZ4 block format with the uncompressed size prepended.
pub struct Lz4;

impl Algorithm for Lz4 {
    fn name(&self) -> &str {
        "LZ4"
    }
}

impl Compression for Lz4 {
    fn validate_properties(&self, _props: &PropertyBag) -> Result<()> {
        Ok(())
    }

    fn compress(&self, input: &[u8], _props: &PropertyBag) -> Result<Vec<u8>> {
        Ok(lz4_flex::compress_prepend_size(input))
    }

    fn decompress(&self, input: &[u8], _props: &PropertyBag) -> Result<Vec<u8>> {
        lz4_flex::decompress_size_prepended(input).map_err(|e| decompress_error(self.name(), e))
    }
}
