use thiserror::Error;

/// Main error type for the reel-slicer library
#[derive(Error, Debug)]
pub enum SlicerError {
    #[error("Video processing error: {0}")]
    Video(#[from] VideoError),

    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why an encode attempt was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeErrorKind {
    /// The encoder refused the requested parameters (codec, audio muxing, options).
    /// Worth one retry with a reduced parameter set.
    ParameterIncompatibility,

    /// Anything else: process spawn failures, I/O, crashes.
    Other,
}

impl std::fmt::Display for EncodeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ParameterIncompatibility => write!(f, "parameter incompatibility"),
            Self::Other => write!(f, "encoder failure"),
        }
    }
}

/// Media engine errors
#[derive(Error, Debug)]
pub enum VideoError {
    #[error("Failed to decode {path}: {reason}")]
    Decode { path: String, reason: String },

    #[error("Encoding failed ({kind}): {reason}")]
    Encode { kind: EncodeErrorKind, reason: String },

    #[error("Media engine unavailable: {reason}")]
    EngineUnavailable { reason: String },

    #[error("Invalid video parameters: {details}")]
    InvalidParameters { details: String },
}

/// Batch orchestration errors
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Input directory not found: {path}")]
    InputDirMissing { path: String },

    #[error("Could not create output directory {path}: {reason}")]
    OutputDirFailed { path: String, reason: String },

    #[error("{input} would overwrite the clips of {claimed_by}")]
    OutputCollision { input: String, claimed_by: String },

    #[error("Worker pool setup failed: {reason}")]
    PoolFailed { reason: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using SlicerError
pub type Result<T> = std::result::Result<T, SlicerError>;

impl SlicerError {
    /// Shorthand for a decode failure on `path`
    pub fn decode<P: std::fmt::Display, S: Into<String>>(path: P, reason: S) -> Self {
        VideoError::Decode {
            path: path.to_string(),
            reason: reason.into(),
        }
        .into()
    }

    /// Shorthand for an encode failure of the given kind
    pub fn encode<S: Into<String>>(kind: EncodeErrorKind, reason: S) -> Self {
        VideoError::Encode {
            kind,
            reason: reason.into(),
        }
        .into()
    }

    /// True when the encoder rejected the parameters rather than failing outright
    pub fn is_parameter_incompatibility(&self) -> bool {
        matches!(
            self,
            Self::Video(VideoError::Encode {
                kind: EncodeErrorKind::ParameterIncompatibility,
                ..
            })
        )
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Video(VideoError::Decode { path, .. }) => {
                format!("Could not decode '{}'. Please check the file exists and is a supported video.", path)
            }
            Self::Video(VideoError::EngineUnavailable { .. }) => {
                "FFmpeg was not found. Please install ffmpeg and ffprobe and make sure they are on PATH.".to_string()
            }
            Self::Batch(BatchError::InputDirMissing { path }) => {
                format!("The input folder '{}' does not exist.", path)
            }
            Self::Batch(BatchError::OutputCollision { input, claimed_by }) => {
                format!("'{}' has the same name as '{}'; rename one of them.", input, claimed_by)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}
