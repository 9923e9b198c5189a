//! Descriptor accessors for the composite two-port configuration.
//!
//! Each port is one CDC-ACM function grouped by an interface association descriptor: a
//! communication interface with the notification endpoint followed by a data interface with the
//! bulk pair.

use crate::backend::CdcBackend;
use crate::cdc::{
    CDC_DESCRIPTOR_TYPE_CS_INTERFACE, CDC_FUNC_ACM, CDC_FUNC_CALL_MANAGEMENT, CDC_FUNC_HEADER,
    CDC_FUNC_UNION, CDC_PROTOCOL_AT, CDC_SUBCLASS_ACM, USB_CLASS_CDC, USB_CLASS_CDC_DATA,
};
use crate::class::DualCdc;
use crate::config::CdcConfig;
use crate::link::UsbLink;
use crate::port::{Port, NUM_PORTS};
use crate::usb::{
    EndpointKind, USB_DESCRIPTOR_TYPE_CONFIGURATION, USB_DESCRIPTOR_TYPE_DEVICE_QUALIFIER,
    USB_DESCRIPTOR_TYPE_ENDPOINT, USB_DESCRIPTOR_TYPE_INTERFACE,
    USB_DESCRIPTOR_TYPE_INTERFACE_ASSOCIATION,
};

const CONFIG_DESCRIPTOR_LEN: usize = 9;
const CONFIGURATION_VALUE: u8 = 1;
/// Self-powered.
const CONFIG_ATTRIBUTES: u8 = 0xc0;
/// 100mA in 2mA units.
const CONFIG_MAX_POWER: u8 = 0x32;
const NOTIFY_INTERVAL: u8 = 0x10;

pub const DEVICE_QUALIFIER_DESCRIPTOR: [u8; 10] = [
    0x0a,
    USB_DESCRIPTOR_TYPE_DEVICE_QUALIFIER,
    0x00,
    0x02, // bcdUSB 2.00
    0x00,
    0x00,
    0x00,
    0x40, // bMaxPacketSize0
    0x01, // bNumConfigurations
    0x00,
];

fn push_endpoint(out: &mut Vec<u8>, ep: u8, kind: EndpointKind, max_packet: u16, interval: u8) {
    let size = max_packet.to_le_bytes();
    out.extend_from_slice(&[
        7,
        USB_DESCRIPTOR_TYPE_ENDPOINT,
        ep,
        kind.attributes(),
        size[0],
        size[1],
        interval,
    ]);
}

fn push_function(out: &mut Vec<u8>, config: &CdcConfig, port: Port, bulk_packet: u16) {
    let interfaces = config.interfaces(port);
    let endpoints = config.endpoints.port(port);

    out.extend_from_slice(&[
        8,
        USB_DESCRIPTOR_TYPE_INTERFACE_ASSOCIATION,
        interfaces.comm,
        2,
        USB_CLASS_CDC,
        CDC_SUBCLASS_ACM,
        CDC_PROTOCOL_AT,
        0,
    ]);

    // Communication interface.
    out.extend_from_slice(&[
        9,
        USB_DESCRIPTOR_TYPE_INTERFACE,
        interfaces.comm,
        0,
        1,
        USB_CLASS_CDC,
        CDC_SUBCLASS_ACM,
        CDC_PROTOCOL_AT,
        0,
    ]);
    out.extend_from_slice(&[5, CDC_DESCRIPTOR_TYPE_CS_INTERFACE, CDC_FUNC_HEADER, 0x10, 0x01]);
    out.extend_from_slice(&[
        5,
        CDC_DESCRIPTOR_TYPE_CS_INTERFACE,
        CDC_FUNC_CALL_MANAGEMENT,
        0x00,
        interfaces.data,
    ]);
    // bmCapabilities: line coding, control line state, serial state notification.
    out.extend_from_slice(&[4, CDC_DESCRIPTOR_TYPE_CS_INTERFACE, CDC_FUNC_ACM, 0x02]);
    out.extend_from_slice(&[
        5,
        CDC_DESCRIPTOR_TYPE_CS_INTERFACE,
        CDC_FUNC_UNION,
        interfaces.comm,
        interfaces.data,
    ]);
    push_endpoint(
        out,
        endpoints.notify,
        EndpointKind::Interrupt,
        config.notify_packet_size,
        NOTIFY_INTERVAL,
    );

    // Data interface.
    out.extend_from_slice(&[
        9,
        USB_DESCRIPTOR_TYPE_INTERFACE,
        interfaces.data,
        0,
        2,
        USB_CLASS_CDC_DATA,
        0,
        0,
        0,
    ]);
    push_endpoint(out, endpoints.bulk_out, EndpointKind::Bulk, bulk_packet, 0);
    push_endpoint(out, endpoints.bulk_in, EndpointKind::Bulk, bulk_packet, 0);
}

/// Builds the full configuration descriptor (header plus both functions) for `bulk_packet`.
pub fn configuration_descriptor(config: &CdcConfig, bulk_packet: u16) -> Vec<u8> {
    let mut out = vec![0u8; CONFIG_DESCRIPTOR_LEN];
    for port in Port::ALL {
        push_function(&mut out, config, port, bulk_packet);
    }

    let total = (out.len() as u16).to_le_bytes();
    out[..CONFIG_DESCRIPTOR_LEN].copy_from_slice(&[
        CONFIG_DESCRIPTOR_LEN as u8,
        USB_DESCRIPTOR_TYPE_CONFIGURATION,
        total[0],
        total[1],
        (NUM_PORTS * 2) as u8,
        CONFIGURATION_VALUE,
        0,
        CONFIG_ATTRIBUTES,
        CONFIG_MAX_POWER,
    ]);
    out
}

impl<L: UsbLink, B: CdcBackend> DualCdc<L, B> {
    pub fn full_speed_configuration_descriptor(&self) -> Vec<u8> {
        configuration_descriptor(&self.config, self.config.fs_packet_size)
    }

    /// High-speed operation is not advertised: there is no high-speed configuration even though
    /// endpoints are sized for it when the link reports a high-speed bus.
    pub fn high_speed_configuration_descriptor(&self) -> Option<Vec<u8>> {
        None
    }

    pub fn other_speed_configuration_descriptor(&self) -> Vec<u8> {
        self.full_speed_configuration_descriptor()
    }

    pub fn device_qualifier_descriptor(&self) -> &'static [u8] {
        &DEVICE_QUALIFIER_DESCRIPTOR
    }
}
