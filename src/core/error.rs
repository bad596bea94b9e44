use std::path::PathBuf;

/// Problems with a request, detected before any work starts.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no input files given")]
    EmptyInput,

    #[error("input file not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("input is not a file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("unsupported input format {ext:?}: {}", .path.display())]
    UnsupportedInput { path: PathBuf, ext: String },

    #[error("no output directory given")]
    MissingOutputDir,

    #[error("output directory not found: {}", .0.display())]
    OutputDirNotFound(PathBuf),

    #[error("output path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("unsupported output format: {0}")]
    UnsupportedOutputFormat(String),

    #[error("invalid resolution {width}x{height}: both sides must be positive")]
    InvalidResolution { width: u32, height: u32 },

    #[error("cannot parse resolution {0:?} (expected a preset key or WxH)")]
    UnparsableResolution(String),

    #[error("invalid bitrate {0:?} (expected <integer>k)")]
    InvalidBitrate(String),

    #[error("unknown codec: {0}")]
    UnknownCodec(String),

    #[error("unknown preset: {0}")]
    UnknownPreset(String),
}

/// Failure converting one item. Never aborts a batch.
#[derive(thiserror::Error, Debug)]
pub enum ConversionError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read source: {0}")]
    Probe(String),

    #[error("{0}")]
    Backend(String),

    /// A panic caught at the item boundary, downgraded to a per-item failure.
    #[error("unexpected fault: {0}")]
    Fault(String),
}
