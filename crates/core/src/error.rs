use std::fmt;
use std::path::PathBuf;

/// Health probe that produced a [`Error::CheckFailed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthCheck {
    Hypervisor,
    Agent,
}

impl fmt::Display for HealthCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hypervisor => f.write_str("hypervisor process"),
            Self::Agent => f.write_str("agent"),
        }
    }
}

/// Errors that can occur when using sandvm.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unrecognised machine type: {0}")]
    UnsupportedMachine(String),

    #[error("feature not supported: {0}")]
    UnsupportedFeature(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to stat image {}: {source}", path.display())]
    ImageStat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to hot plug device on bridge {bridge}: there are no empty slots")]
    BridgeFull { bridge: String },

    #[error("unable to hot unplug device {device}: not present on bridge {bridge}")]
    DeviceNotOnBridge { bridge: String, device: String },

    #[error("hypervisor error: {0}")]
    Hypervisor(String),

    #[error("agent error: {0}")]
    Agent(String),

    #[error("failed to ping {check}: {source}")]
    CheckFailed {
        check: HealthCheck,
        #[source]
        source: Box<Error>,
    },

    #[error("runtime error: {0}")]
    Runtime(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wraps `source` as a failure of the given health probe.
    pub fn check_failed(check: HealthCheck, source: Error) -> Self {
        Self::CheckFailed {
            check,
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
