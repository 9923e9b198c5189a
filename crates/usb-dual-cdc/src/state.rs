//! Per-instance transfer state, alive only while the configuration is selected.

use crate::control::ControlStage;
use crate::error::{CdcError, Result};
use crate::port::NUM_PORTS;

/// Transmit side of one port: at most one bulk IN transfer is in flight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum TxState {
    #[default]
    Idle,
    Sending,
}

impl TxState {
    pub(crate) fn is_sending(self) -> bool {
        self == TxState::Sending
    }
}

#[derive(Debug)]
pub(crate) struct PortState {
    pub(crate) tx: TxState,
    pub(crate) tx_buffer: Vec<u8>,
    /// `None` only while the buffer is lent to the backend's receive callback.
    pub(crate) rx_buffer: Option<Vec<u8>>,
    pub(crate) rx_len: usize,
}

impl PortState {
    /// Creates an idle port with a zeroed receive buffer of `rx_capacity` bytes.
    pub(crate) fn new(rx_capacity: usize) -> Result<Self> {
        Ok(Self {
            tx: TxState::Idle,
            tx_buffer: Vec::new(),
            rx_buffer: Some(try_alloc_zeroed(rx_capacity)?),
            rx_len: 0,
        })
    }
}

/// Class instance state: both ports' transfer state, the backend context of each port, and the
/// endpoint 0 staging slot they share.
pub(crate) struct ClassState<C> {
    pub(crate) ports: [PortState; NUM_PORTS],
    pub(crate) contexts: [C; NUM_PORTS],
    pub(crate) control: ControlStage,
}

pub(crate) fn try_alloc_zeroed(len: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| CdcError::AllocationFailure { len })?;
    buf.resize(len, 0);
    Ok(buf)
}
