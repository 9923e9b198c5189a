//! Per-port application callbacks.

use crate::port::Port;
use crate::transfer::PortIo;
use crate::usb::RequestDirection;

/// A class-specific request routed to one port.
#[derive(Debug)]
pub struct ClassRequest<'a> {
    pub opcode: u8,
    pub value: u16,
    pub direction: RequestDirection,
    /// Payload in the shared staging buffer. For device-to-host requests it arrives zeroed, the
    /// backend fills it, and exactly `data.len()` bytes are returned to the host. Empty for
    /// requests without a data stage.
    pub data: &'a mut [u8],
}

/// Byte-stream producer/consumer and class-request handler for the serial ports.
///
/// One backend serves both ports; each port gets its own [`CdcBackend::Context`] from
/// [`CdcBackend::init`], and every later callback receives that context back together with a
/// [`PortIo`] for the same port. Callbacks run to completion inside the event that triggered
/// them and must not block.
pub trait CdcBackend {
    type Context;

    /// Called once per port when the configuration is selected, before reception is armed.
    /// The backend may install its own transmit/receive buffers through `io`.
    fn init(&mut self, port: Port, io: &mut PortIo<'_>) -> Self::Context;

    /// Called once per port when the configuration is torn down.
    fn deinit(&mut self, ctx: Self::Context);

    fn control(&mut self, ctx: &mut Self::Context, io: &mut PortIo<'_>, request: ClassRequest<'_>);

    /// A bulk OUT packet landed in the port's receive buffer.
    ///
    /// `data` holds the received bytes; `len` starts at the received count and whatever the
    /// backend leaves in it is recorded as the port's received length. Reception is not re-armed
    /// automatically: the backend calls [`PortIo::receive_packet`] once it can take more data.
    fn receive(
        &mut self,
        ctx: &mut Self::Context,
        io: &mut PortIo<'_>,
        data: &[u8],
        len: &mut usize,
    );

    /// The port's outstanding bulk IN transfer finished; the port may transmit again.
    fn transmit_complete(&mut self, ctx: &mut Self::Context, io: &mut PortIo<'_>);
}
