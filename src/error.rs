use thiserror::Error;

#[derive(Error, Debug)]
pub enum HomewatchError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Sensor error: {0}")]
    Sensor(#[from] SensorError),

    #[error("Startup failed: {message}")]
    Startup { message: String },

    #[error("System error: {message}")]
    System { message: String },
}

impl HomewatchError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    /// Errors that must stop the process instead of being absorbed by a loop
    pub fn is_startup_fatal(&self) -> bool {
        matches!(self, HomewatchError::Startup { .. } | HomewatchError::Config(_))
    }
}

/// Failures of a single photo capture
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Failed to create capture directory {path}: {source}")]
    DirectoryCreation {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create image file {path}: {source}")]
    FileCreation {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write image file {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Camera unavailable: {details}")]
    CameraUnavailable { details: String },

    #[error("Capture mechanism failed: {details}")]
    Mechanism { details: String },

    #[error("Capture mechanism returned no image data")]
    EmptyImage,
}

impl CaptureError {
    /// A fatal failure means further shots in the same sequence cannot succeed
    pub fn is_fatal(&self) -> bool {
        matches!(self, CaptureError::CameraUnavailable { .. })
    }
}

/// Errors reported by the Telegram transport
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Bot API rejected the credential: {description}")]
    Unauthorized { description: String },

    #[error("Bot API error {code:?}: {description}")]
    Api {
        code: Option<i64>,
        description: String,
    },

    #[error("Bot API returned an empty result for {method}")]
    EmptyResult { method: String },
}

impl TransportError {
    pub fn is_unauthorized(&self) -> bool {
        match self {
            TransportError::Unauthorized { .. } => true,
            TransportError::Http(e) => e.status() == Some(reqwest::StatusCode::UNAUTHORIZED),
            _ => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Failed to send message: {0}")]
    Transport(#[from] TransportError),

    #[error("Failed to read photo {path}: {source}")]
    PhotoRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum SensorError {
    #[error("Failed to export GPIO pin {pin}: {details}")]
    GpioExport { pin: String, details: String },

    #[error("Failed to read GPIO value from {path}: {source}")]
    GpioRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unexpected GPIO value '{value}'")]
    InvalidValue { value: String },

    #[error("Terminal input error: {details}")]
    Terminal { details: String },
}

pub type Result<T> = std::result::Result<T, HomewatchError>;
