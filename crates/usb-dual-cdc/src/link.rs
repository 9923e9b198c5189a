//! Contract with the USB protocol engine underneath the class driver.
//!
//! The link layer owns the transceiver, enumeration, and endpoint 0 signalling. The class driver
//! only asks it to open/close endpoints and to start transfers; completion is reported later as
//! a [`LinkEvent`], never awaited in place.

use crate::usb::{EndpointKind, SetupPacket, UsbSpeed};

pub trait UsbLink {
    fn open_endpoint(&mut self, ep: u8, kind: EndpointKind, max_packet_size: u16);

    fn close_endpoint(&mut self, ep: u8);

    /// Starts an IN transfer of `data` on a bulk or interrupt endpoint.
    ///
    /// The link layer copies what it needs before returning; completion is reported with
    /// [`LinkEvent::DataIn`].
    fn transmit(&mut self, ep: u8, data: &[u8]);

    /// Arms an OUT endpoint to accept up to `max_len` bytes.
    fn prepare_receive(&mut self, ep: u8, max_len: usize);

    /// Copies the packet that completed on `ep` into `buf` and returns the byte count the
    /// hardware reported. Called once per [`LinkEvent::DataOut`].
    fn read_received(&mut self, ep: u8, buf: &mut [u8]) -> usize;

    /// Sends the data stage of a device-to-host control transfer on endpoint 0.
    fn control_send(&mut self, data: &[u8]);

    /// Arms endpoint 0 for a host-to-device data stage of `len` bytes.
    fn control_prepare_receive(&mut self, len: usize);

    /// Copies the completed endpoint 0 data stage into `buf` and returns its length.
    fn read_control_data(&mut self, buf: &mut [u8]) -> usize;
}

/// Inbound notification from the link layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkEvent {
    /// The host selected the configuration at the given bus speed.
    Configured(UsbSpeed),
    /// The configuration was deselected or the bus was reset.
    Deconfigured,
    Setup(SetupPacket),
    /// An IN transfer finished on the endpoint.
    DataIn(u8),
    /// An OUT transfer finished on the endpoint.
    DataOut(u8),
    /// The host-to-device data stage of the current control transfer has landed.
    Ep0RxReady,
}
