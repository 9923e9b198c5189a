//! Static endpoint layout of the two serial ports.
//!
//! Each port owns a bulk IN/OUT pair for its byte stream plus an interrupt IN endpoint for
//! notifications. Endpoint 0 is shared and never appears in this table. Inbound completion
//! events carry only an endpoint address, so the reverse lookup here is how they are routed to
//! a port.

use crate::port::{Port, NUM_PORTS};
use crate::usb::{EndpointKind, USB_ENDPOINT_DIR_IN};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EndpointRole {
    BulkIn,
    BulkOut,
    /// Interrupt IN endpoint carrying serial-state notifications.
    Notify,
}

impl EndpointRole {
    pub const ALL: [EndpointRole; 3] = [
        EndpointRole::BulkIn,
        EndpointRole::BulkOut,
        EndpointRole::Notify,
    ];

    pub fn kind(self) -> EndpointKind {
        match self {
            EndpointRole::BulkIn | EndpointRole::BulkOut => EndpointKind::Bulk,
            EndpointRole::Notify => EndpointKind::Interrupt,
        }
    }

    pub fn is_in(self) -> bool {
        !matches!(self, EndpointRole::BulkOut)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PortEndpoints {
    pub bulk_in: u8,
    pub bulk_out: u8,
    pub notify: u8,
}

impl PortEndpoints {
    pub const fn get(&self, role: EndpointRole) -> u8 {
        match role {
            EndpointRole::BulkIn => self.bulk_in,
            EndpointRole::BulkOut => self.bulk_out,
            EndpointRole::Notify => self.notify,
        }
    }

    fn role_of(&self, ep: u8) -> Option<EndpointRole> {
        EndpointRole::ALL
            .into_iter()
            .find(|&role| self.get(role) == ep)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EndpointMap {
    ports: [PortEndpoints; NUM_PORTS],
}

impl EndpointMap {
    pub const DEFAULT: EndpointMap = EndpointMap {
        ports: [
            PortEndpoints {
                bulk_in: 0x81,
                bulk_out: 0x01,
                notify: 0x82,
            },
            PortEndpoints {
                bulk_in: 0x84,
                bulk_out: 0x04,
                notify: 0x85,
            },
        ],
    };

    pub const fn new(port0: PortEndpoints, port1: PortEndpoints) -> Self {
        Self {
            ports: [port0, port1],
        }
    }

    pub const fn port(&self, port: Port) -> &PortEndpoints {
        &self.ports[port.index()]
    }

    pub const fn endpoint(&self, port: Port, role: EndpointRole) -> u8 {
        self.ports[port.index()].get(role)
    }

    /// Resolves an endpoint address back to the port that owns it.
    pub fn port_of(&self, ep: u8) -> Option<Port> {
        self.lookup(ep).map(|(port, _)| port)
    }

    pub fn lookup(&self, ep: u8) -> Option<(Port, EndpointRole)> {
        Port::ALL
            .into_iter()
            .find_map(|port| self.port(port).role_of(ep).map(|role| (port, role)))
    }

    /// Every `(port, role, address)` triple, port 0 first.
    pub fn iter(&self) -> impl Iterator<Item = (Port, EndpointRole, u8)> + '_ {
        Port::ALL.into_iter().flat_map(move |port| {
            EndpointRole::ALL
                .into_iter()
                .map(move |role| (port, role, self.endpoint(port, role)))
        })
    }
}

impl Default for EndpointMap {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Returns true if `ep` carries the IN direction bit.
pub fn is_in_endpoint(ep: u8) -> bool {
    ep & USB_ENDPOINT_DIR_IN != 0
}

/// Endpoint number without the direction bit.
pub fn endpoint_number(ep: u8) -> u8 {
    ep & 0x0f
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_round_trips_every_role() {
        let map = EndpointMap::DEFAULT;
        for (port, role, ep) in map.iter() {
            assert_eq!(map.lookup(ep), Some((port, role)), "ep {ep:#04x}");
            assert_eq!(is_in_endpoint(ep), role.is_in(), "ep {ep:#04x}");
        }
        assert_eq!(map.iter().count(), 6);
    }

    #[test]
    fn out_and_in_addresses_with_same_number_are_distinct() {
        let map = EndpointMap::DEFAULT;
        assert_eq!(map.lookup(0x01), Some((Port::Port0, EndpointRole::BulkOut)));
        assert_eq!(map.lookup(0x81), Some((Port::Port0, EndpointRole::BulkIn)));
        assert_eq!(map.lookup(0x04), Some((Port::Port1, EndpointRole::BulkOut)));
        assert_eq!(map.lookup(0x84), Some((Port::Port1, EndpointRole::BulkIn)));
    }

    #[test]
    fn control_and_unknown_endpoints_do_not_resolve() {
        let map = EndpointMap::DEFAULT;
        assert_eq!(map.port_of(0x00), None);
        assert_eq!(map.port_of(0x80), None);
        assert_eq!(map.port_of(0x02), None);
        assert_eq!(map.port_of(0x86), None);
    }
}
