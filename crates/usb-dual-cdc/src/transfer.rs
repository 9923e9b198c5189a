//! Bulk data path: transmit/receive requests and their completion events.
//!
//! Each port allows a single bulk IN transfer in flight. A second request while one is
//! outstanding is rejected with [`CdcError::Busy`] rather than queued, so retry policy stays with
//! the backend. Reception is never re-armed automatically; a slow consumer applies back-pressure
//! simply by delaying its next [`PortIo::receive_packet`].

use tracing::{trace, warn};

use crate::backend::CdcBackend;
use crate::class::DualCdc;
use crate::endpoints::{EndpointRole, PortEndpoints};
use crate::error::{CdcError, Result};
use crate::link::UsbLink;
use crate::port::Port;
use crate::state::{ClassState, PortState, TxState};

/// Data-path operations on one port, borrowed for the duration of a single call.
///
/// Backend callbacks receive one of these for the port the event belongs to; application code
/// reaches the same operations through [`DualCdc`].
pub struct PortIo<'a> {
    port: Port,
    state: &'a mut PortState,
    link: &'a mut dyn UsbLink,
    endpoints: PortEndpoints,
    packet_size: u16,
}

impl<'a> PortIo<'a> {
    pub(crate) fn new(
        port: Port,
        state: &'a mut PortState,
        link: &'a mut dyn UsbLink,
        endpoints: PortEndpoints,
        packet_size: u16,
    ) -> Self {
        Self {
            port,
            state,
            link,
            endpoints,
            packet_size,
        }
    }

    pub fn port(&self) -> Port {
        self.port
    }

    /// Bulk packet size at the negotiated bus speed.
    pub fn packet_size(&self) -> u16 {
        self.packet_size
    }

    pub fn is_transmitting(&self) -> bool {
        self.state.tx.is_sending()
    }

    /// Length recorded for the most recent OUT packet.
    pub fn received_len(&self) -> usize {
        self.state.rx_len
    }

    /// Installs the data sent by the next [`PortIo::transmit_packet`].
    ///
    /// Fails with [`CdcError::Busy`] while a transfer is in flight: the buffer handed to the
    /// hardware stays in place until its completion event.
    pub fn set_transmit_buffer(&mut self, data: Vec<u8>) -> Result<()> {
        if self.is_transmitting() {
            return Err(CdcError::Busy);
        }
        self.state.tx_buffer = data;
        Ok(())
    }

    /// Installs the buffer that subsequent OUT packets land in.
    pub fn set_receive_buffer(&mut self, buf: Vec<u8>) {
        self.state.rx_buffer = Some(buf);
    }

    /// Starts a bulk IN transfer of the installed transmit buffer.
    pub fn transmit_packet(&mut self) -> Result<()> {
        if self.is_transmitting() {
            trace!(port = %self.port, "transmit rejected, transfer in flight");
            return Err(CdcError::Busy);
        }
        self.state.tx = TxState::Sending;
        trace!(
            port = %self.port,
            ep = self.endpoints.bulk_in,
            len = self.state.tx_buffer.len(),
            "bulk IN"
        );
        self.link.transmit(self.endpoints.bulk_in, &self.state.tx_buffer);
        Ok(())
    }

    /// Arms the bulk OUT endpoint for the next packet.
    pub fn receive_packet(&mut self) {
        let max_len = usize::from(self.packet_size);
        self.link.prepare_receive(self.endpoints.bulk_out, max_len);
    }
}

/// Copies the packet that completed on `ep` into the port's receive buffer and records its
/// length.
fn land_received(state: &mut PortState, link: &mut dyn UsbLink, port: Port, ep: u8) -> usize {
    let mut scratch = Vec::new();
    let buf = state.rx_buffer.as_mut().unwrap_or(&mut scratch);
    let reported = link.read_received(ep, buf);
    let len = reported.min(buf.len());
    if len < reported {
        warn!(
            %port,
            reported,
            capacity = buf.len(),
            "OUT packet larger than receive buffer, truncated"
        );
    }
    state.rx_len = len;
    len
}

impl<L: UsbLink, B: CdcBackend> DualCdc<L, B> {
    pub(crate) fn port_io<'a>(
        link: &'a mut L,
        endpoints: PortEndpoints,
        packet_size: u16,
        port: Port,
        state: &'a mut PortState,
    ) -> PortIo<'a> {
        PortIo::new(port, state, link, endpoints, packet_size)
    }

    /// Runs `f` against `port`'s data path, or fails if the class is not configured.
    pub(crate) fn with_port<R>(
        &mut self,
        port: Port,
        f: impl FnOnce(&mut PortIo<'_>) -> R,
    ) -> Result<R> {
        let state = self.state.as_mut().ok_or(CdcError::NotConfigured)?;
        let endpoints = *self.config.endpoints.port(port);
        let packet_size = self.config.bulk_packet_size(self.speed);
        let mut io = Self::port_io(
            &mut self.link,
            endpoints,
            packet_size,
            port,
            &mut state.ports[port.index()],
        );
        Ok(f(&mut io))
    }

    pub fn set_transmit_buffer(&mut self, port: Port, data: Vec<u8>) -> Result<()> {
        self.with_port(port, |io| io.set_transmit_buffer(data))?
    }

    pub fn set_receive_buffer(&mut self, port: Port, buf: Vec<u8>) -> Result<()> {
        self.with_port(port, |io| io.set_receive_buffer(buf))
    }

    /// Starts a bulk IN transfer of `port`'s transmit buffer.
    ///
    /// Returns [`CdcError::Busy`] without side effects while the previous transfer is
    /// outstanding, and [`CdcError::NotConfigured`] before activation.
    pub fn transmit_packet(&mut self, port: Port) -> Result<()> {
        self.with_port(port, |io| io.transmit_packet())?
    }

    /// Re-arms reception on `port`'s bulk OUT endpoint.
    pub fn receive_packet(&mut self, port: Port) -> Result<()> {
        self.with_port(port, |io| io.receive_packet())
    }

    /// Bulk IN completion on `ep`: the port returns to idle and the backend is told.
    ///
    /// Only the port's bulk IN endpoint ends a transmit; completions reported for its other
    /// endpoints are ignored.
    pub fn handle_data_in(&mut self, ep: u8) -> Result<()> {
        let Some(state) = self.state.as_mut() else {
            warn!(ep, "IN completion while deconfigured");
            return Err(CdcError::NotConfigured);
        };
        let port = match self.config.endpoints.lookup(ep) {
            Some((port, EndpointRole::BulkIn)) => port,
            Some((port, role)) => {
                warn!(%port, ep, ?role, "IN completion on non bulk IN endpoint ignored");
                return Ok(());
            }
            None => {
                warn!(ep, "IN completion on unknown endpoint ignored");
                return Ok(());
            }
        };
        let Some(backend) = self.backend.as_mut() else {
            return Err(CdcError::NoBackend);
        };
        trace!(%port, ep, "IN complete");

        let ClassState { ports, contexts, .. } = state;
        let port_state = &mut ports[port.index()];
        port_state.tx = TxState::Idle;

        let mut io = Self::port_io(
            &mut self.link,
            *self.config.endpoints.port(port),
            self.config.bulk_packet_size(self.speed),
            port,
            port_state,
        );
        backend.transmit_complete(&mut contexts[port.index()], &mut io);
        Ok(())
    }

    /// Bulk OUT completion on `ep`: records the length and hands the data to the backend
    /// immediately. Reception stays disarmed until the backend asks for more.
    pub fn handle_data_out(&mut self, ep: u8) -> Result<()> {
        let Some(state) = self.state.as_mut() else {
            warn!(ep, "OUT completion while deconfigured");
            return Err(CdcError::NotConfigured);
        };
        let port = match self.config.endpoints.lookup(ep) {
            Some((port, EndpointRole::BulkOut)) => port,
            Some((port, role)) => {
                warn!(%port, ep, ?role, "OUT completion on non bulk OUT endpoint ignored");
                return Ok(());
            }
            None => {
                warn!(ep, "OUT completion on unknown endpoint ignored");
                return Ok(());
            }
        };
        let Some(backend) = self.backend.as_mut() else {
            return Err(CdcError::NoBackend);
        };

        let ClassState { ports, contexts, .. } = state;
        let port_state = &mut ports[port.index()];
        let received = land_received(port_state, &mut self.link, port, ep);
        trace!(%port, ep, received, "OUT complete");

        let buf = port_state.rx_buffer.take().unwrap_or_default();
        let mut len = received;
        {
            let mut io = Self::port_io(
                &mut self.link,
                *self.config.endpoints.port(port),
                self.config.bulk_packet_size(self.speed),
                port,
                port_state,
            );
            backend.receive(
                &mut contexts[port.index()],
                &mut io,
                &buf[..received],
                &mut len,
            );
        }
        port_state.rx_len = len;
        // Keep the lent buffer unless the backend installed a replacement meanwhile.
        if port_state.rx_buffer.is_none() {
            port_state.rx_buffer = Some(buf);
        }
        Ok(())
    }
}
