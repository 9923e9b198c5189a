use thiserror::Error;

pub type Result<T> = std::result::Result<T, CdcError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CdcError {
    /// The host has not selected the configuration (or has deselected it).
    #[error("cdc class is not configured")]
    NotConfigured,

    /// A bulk IN transfer is already outstanding on the port.
    #[error("transmit already in flight")]
    Busy,

    #[error("out of memory allocating {len} bytes of class state")]
    AllocationFailure { len: usize },

    #[error("no port backend registered")]
    NoBackend,

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("endpoint {0:#04x} is assigned more than once")]
    DuplicateEndpoint(u8),

    #[error("endpoint {ep:#04x} has the wrong direction for {role}")]
    EndpointDirection { ep: u8, role: &'static str },

    #[error("endpoint 0 is reserved for control transfers")]
    ControlEndpoint,

    #[error("interface {0} is assigned more than once")]
    DuplicateInterface(u8),

    #[error("{0} packet size must be non-zero")]
    ZeroPacketSize(&'static str),

    #[error("control staging buffer ({staging} bytes) is smaller than a full-speed packet ({packet} bytes)")]
    StagingTooSmall { staging: usize, packet: u16 },
}
