use thiserror::Error;

#[derive(Error, Debug)]
pub enum FwcutterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("Unsupported WHENCE format version: expected '{expected}', found '{found}'")]
    FormatVersion { expected: String, found: String },

    #[error("Duplicate file '{name}' in entry '{entry}'")]
    DuplicateFile { entry: String, name: String },

    #[error("Unsupported compression codec '{0}'. Valid codecs: none, gzip, xz, zstd")]
    UnsupportedCodec(String),

    #[error("Source file '{path}' for entry '{entry}' does not exist")]
    MissingSource { entry: String, path: String },

    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, FwcutterError>;
