//! Compression codec selection and streaming
//!
//! The codec set is a closed enumeration; selector parsing fails before
//! any I/O happens so an unsupported codec never produces a partial
//! destination tree.

use std::io::{self, Read, Write};

use crate::error::{FwcutterError, Result};

/// Recognized compression codecs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Compression {
    #[default]
    None,
    Gzip,
    Xz,
    Zstd,
}

impl Compression {
    /// Parse a codec selector as given on the command line
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "none" => Ok(Self::None),
            "gzip" | "gz" => Ok(Self::Gzip),
            "xz" => Ok(Self::Xz),
            "zstd" | "zst" => Ok(Self::Zstd),
            other => Err(FwcutterError::UnsupportedCodec(other.to_string())),
        }
    }

    /// Conventional file extension, without the dot
    pub fn extension(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Gzip => Some("gz"),
            Self::Xz => Some("xz"),
            Self::Zstd => Some("zst"),
        }
    }

    /// Codec a file name already carries, judged by its extension
    pub fn from_path(name: &str) -> Self {
        if name.ends_with(".gz") {
            Self::Gzip
        } else if name.ends_with(".xz") {
            Self::Xz
        } else if name.ends_with(".zst") {
            Self::Zstd
        } else {
            Self::None
        }
    }

    /// Append this codec's extension to a relative path
    pub fn apply_extension(self, name: &str) -> String {
        match self.extension() {
            Some(ext) => format!("{name}.{ext}"),
            None => name.to_string(),
        }
    }

    /// Wrap `reader` so that it yields decompressed bytes
    pub fn decompress<'a>(self, reader: Box<dyn Read + 'a>) -> io::Result<Box<dyn Read + 'a>> {
        Ok(match self {
            Self::None => reader,
            Self::Gzip => Box::new(flate2::read::GzDecoder::new(reader)),
            Self::Xz => Box::new(xz2::read::XzDecoder::new(reader)),
            Self::Zstd => Box::new(zstd::stream::read::Decoder::new(reader)?),
        })
    }

    /// Copy `reader` into `writer` through this codec, finishing the stream
    pub fn compress(self, reader: &mut dyn Read, writer: &mut dyn Write) -> io::Result<()> {
        match self {
            Self::None => {
                io::copy(reader, writer)?;
            }
            Self::Gzip => {
                let mut encoder =
                    flate2::write::GzEncoder::new(writer, flate2::Compression::default());
                io::copy(reader, &mut encoder)?;
                encoder.finish()?;
            }
            Self::Xz => {
                let mut encoder = xz2::write::XzEncoder::new(writer, 6);
                io::copy(reader, &mut encoder)?;
                encoder.finish()?;
            }
            Self::Zstd => {
                let mut encoder = zstd::stream::write::Encoder::new(writer, 0)?;
                io::copy(reader, &mut encoder)?;
                encoder.finish()?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_selectors() {
        assert_eq!(Compression::from_name("none").unwrap(), Compression::None);
        assert_eq!(Compression::from_name("gzip").unwrap(), Compression::Gzip);
        assert_eq!(Compression::from_name("xz").unwrap(), Compression::Xz);
        assert_eq!(Compression::from_name("zst").unwrap(), Compression::Zstd);
        assert_eq!(Compression::from_name("zstd").unwrap(), Compression::Zstd);
    }

    #[test]
    fn rejects_unknown_selector() {
        let err = Compression::from_name("lz4").unwrap_err();
        assert!(matches!(err, FwcutterError::UnsupportedCodec(ref name) if name == "lz4"));
    }

    #[test]
    fn extension_round_trips_through_from_path() {
        for codec in [Compression::Gzip, Compression::Xz, Compression::Zstd] {
            let name = codec.apply_extension("fw/chip.bin");
            assert_eq!(Compression::from_path(&name), codec);
        }
        assert_eq!(Compression::from_path("fw/chip.bin"), Compression::None);
        assert_eq!(Compression::None.apply_extension("fw/chip.bin"), "fw/chip.bin");
    }

    #[test]
    fn compress_then_decompress_is_identity() {
        let payload = b"not very compressible payload \x00\x01\x02".repeat(64);
        for codec in [
            Compression::None,
            Compression::Gzip,
            Compression::Xz,
            Compression::Zstd,
        ] {
            let mut compressed = Vec::new();
            codec
                .compress(&mut payload.as_slice(), &mut compressed)
                .unwrap();

            let mut restored = Vec::new();
            codec
                .decompress(Box::new(compressed.as_slice()))
                .unwrap()
                .read_to_end(&mut restored)
                .unwrap();
            assert_eq!(restored, payload, "{codec:?} round trip");
        }
    }
}
