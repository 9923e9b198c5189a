//! Endpoint 0 request routing for both ports.
//!
//! Both ports share a single staging buffer, so only one class request can be in flight at a
//! time across the whole device. A SETUP that arrives before the previous request's data stage
//! has completed replaces the pending request; nothing else signals the overlap.

use tracing::{debug, trace, warn};

use crate::backend::{CdcBackend, ClassRequest};
use crate::class::DualCdc;
use crate::error::Result;
use crate::link::UsbLink;
use crate::port::Port;
use crate::state::{try_alloc_zeroed, ClassState};
use crate::usb::{
    RequestDirection, RequestType, SetupPacket, USB_REQUEST_GET_INTERFACE,
    USB_REQUEST_SET_INTERFACE,
};

/// Host-to-device class request waiting for its data stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PendingRequest {
    pub(crate) opcode: u8,
    pub(crate) value: u16,
    pub(crate) len: usize,
}

/// Single-slot staging area for the in-flight control transfer.
#[derive(Debug)]
pub(crate) struct ControlStage {
    staging: Vec<u8>,
    pending: Option<PendingRequest>,
    /// Port targeted by the most recent SETUP packet.
    active_port: Port,
}

impl ControlStage {
    pub(crate) fn new(staging_len: usize) -> Result<Self> {
        Ok(Self {
            staging: try_alloc_zeroed(staging_len)?,
            pending: None,
            active_port: Port::Port0,
        })
    }

    pub(crate) fn active_port(&self) -> Port {
        self.active_port
    }

    pub(crate) fn pending(&self) -> Option<PendingRequest> {
        self.pending
    }

    /// Clamps a requested data stage length to the staging buffer.
    fn stage_len(&self, setup: &SetupPacket) -> usize {
        let requested = usize::from(setup.w_length);
        if requested > self.staging.len() {
            warn!(
                request = setup.b_request,
                requested,
                staging = self.staging.len(),
                "class request longer than staging buffer, clamped"
            );
        }
        requested.min(self.staging.len())
    }
}

impl<L: UsbLink, B: CdcBackend> DualCdc<L, B> {
    /// Routes a SETUP packet addressed to one of the serial ports.
    ///
    /// Never fails: requests this driver does not implement are ignored so the link layer's
    /// default handling applies.
    pub fn handle_setup(&mut self, setup: SetupPacket) {
        let Some(state) = self.state.as_mut() else {
            warn!(?setup, "SETUP while deconfigured ignored");
            return;
        };
        let port = self.config.port_for_interface(setup.interface_number());
        state.control.active_port = port;

        match setup.request_type() {
            RequestType::Class => {
                let Some(backend) = self.backend.as_mut() else {
                    return;
                };
                let ClassState {
                    ports,
                    contexts,
                    control,
                } = state;
                let endpoints = *self.config.endpoints.port(port);
                let packet_size = self.config.bulk_packet_size(self.speed);

                if setup.w_length == 0 {
                    debug!(%port, request = setup.b_request, "class request");
                    let mut io = Self::port_io(
                        &mut self.link,
                        endpoints,
                        packet_size,
                        port,
                        &mut ports[port.index()],
                    );
                    backend.control(
                        &mut contexts[port.index()],
                        &mut io,
                        ClassRequest {
                            opcode: setup.b_request,
                            value: setup.w_value,
                            direction: setup.request_direction(),
                            data: &mut [],
                        },
                    );
                    return;
                }

                let len = control.stage_len(&setup);
                match setup.request_direction() {
                    RequestDirection::DeviceToHost => {
                        debug!(%port, request = setup.b_request, len, "class request IN");
                        control.staging[..len].fill(0);
                        {
                            let mut io = Self::port_io(
                                &mut self.link,
                                endpoints,
                                packet_size,
                                port,
                                &mut ports[port.index()],
                            );
                            backend.control(
                                &mut contexts[port.index()],
                                &mut io,
                                ClassRequest {
                                    opcode: setup.b_request,
                                    value: setup.w_value,
                                    direction: RequestDirection::DeviceToHost,
                                    data: &mut control.staging[..len],
                                },
                            );
                        }
                        self.link.control_send(&control.staging[..len]);
                    }
                    RequestDirection::HostToDevice => {
                        debug!(%port, request = setup.b_request, len, "class request OUT");
                        if let Some(stale) = control.pending {
                            trace!(
                                opcode = stale.opcode,
                                "pending class request replaced before its data stage"
                            );
                        }
                        control.pending = Some(PendingRequest {
                            opcode: setup.b_request,
                            value: setup.w_value,
                            len,
                        });
                        self.link.control_prepare_receive(len);
                    }
                }
            }
            RequestType::Standard => match setup.b_request {
                USB_REQUEST_GET_INTERFACE => {
                    // Single alternate setting on every interface.
                    self.link.control_send(&[0]);
                }
                USB_REQUEST_SET_INTERFACE => {
                    trace!(%port, alt = setup.w_value, "SET_INTERFACE accepted");
                }
                _ => {}
            },
            RequestType::Vendor | RequestType::Reserved => {}
        }
    }

    /// Data stage of a host-to-device class request has landed in the staging buffer.
    ///
    /// Delivers the pending request to the port that issued the last SETUP, then clears it so a
    /// repeated notification is a no-op.
    pub fn handle_ep0_rx_ready(&mut self) {
        let Some(state) = self.state.as_mut() else {
            warn!("EP0 data stage while deconfigured ignored");
            return;
        };
        let Some(backend) = self.backend.as_mut() else {
            return;
        };
        let ClassState {
            ports,
            contexts,
            control,
        } = state;
        let Some(pending) = control.pending.take() else {
            trace!("EP0 data stage without pending class request");
            return;
        };

        let port = control.active_port;
        let landed = self.link.read_control_data(&mut control.staging[..pending.len]);
        if landed != pending.len {
            trace!(%port, expected = pending.len, landed, "short EP0 data stage");
        }
        debug!(%port, request = pending.opcode, len = pending.len, "class request data stage");

        let mut io = Self::port_io(
            &mut self.link,
            *self.config.endpoints.port(port),
            self.config.bulk_packet_size(self.speed),
            port,
            &mut ports[port.index()],
        );
        backend.control(
            &mut contexts[port.index()],
            &mut io,
            ClassRequest {
                opcode: pending.opcode,
                value: pending.value,
                direction: RequestDirection::HostToDevice,
                data: &mut control.staging[..pending.len],
            },
        );
    }
}
