use crate::endpoints::{endpoint_number, is_in_endpoint, EndpointMap, EndpointRole};
use crate::error::ConfigError;
use crate::port::{Port, NUM_PORTS};
use crate::usb::UsbSpeed;

pub const CDC_DATA_FS_MAX_PACKET_SIZE: u16 = 64;
pub const CDC_DATA_HS_MAX_PACKET_SIZE: u16 = 512;
pub const CDC_CMD_PACKET_SIZE: u16 = 8;

/// Size of the shared endpoint-0 staging buffer (one high-speed packet).
pub const CDC_CONTROL_STAGING_LEN: usize = CDC_DATA_HS_MAX_PACKET_SIZE as usize;

/// Communication/data interface pair of one port.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PortInterfaces {
    pub comm: u8,
    pub data: u8,
}

impl PortInterfaces {
    pub fn contains(&self, interface: u8) -> bool {
        self.comm == interface || self.data == interface
    }
}

/// Fixed layout and sizing constants of the dual-port class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CdcConfig {
    pub endpoints: EndpointMap,
    pub interfaces: [PortInterfaces; NUM_PORTS],
    pub fs_packet_size: u16,
    pub hs_packet_size: u16,
    pub notify_packet_size: u16,
    pub staging_len: usize,
}

impl Default for CdcConfig {
    fn default() -> Self {
        Self {
            endpoints: EndpointMap::DEFAULT,
            interfaces: [
                PortInterfaces { comm: 0, data: 1 },
                PortInterfaces { comm: 2, data: 3 },
            ],
            fs_packet_size: CDC_DATA_FS_MAX_PACKET_SIZE,
            hs_packet_size: CDC_DATA_HS_MAX_PACKET_SIZE,
            notify_packet_size: CDC_CMD_PACKET_SIZE,
            staging_len: CDC_CONTROL_STAGING_LEN,
        }
    }
}

impl CdcConfig {
    /// Bulk packet size used by both ports at the negotiated speed.
    pub fn bulk_packet_size(&self, speed: UsbSpeed) -> u16 {
        match speed {
            UsbSpeed::High => self.hs_packet_size,
            UsbSpeed::Full | UsbSpeed::Low => self.fs_packet_size,
        }
    }

    pub fn interfaces(&self, port: Port) -> PortInterfaces {
        self.interfaces[port.index()]
    }

    /// Port addressed by a request's interface number.
    ///
    /// Only port 1's interfaces are matched; anything else, including device-recipient
    /// requests, lands on port 0.
    pub fn port_for_interface(&self, interface: u8) -> Port {
        if self.interfaces(Port::Port1).contains(interface) {
            Port::Port1
        } else {
            Port::Port0
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fs_packet_size == 0 {
            return Err(ConfigError::ZeroPacketSize("full-speed bulk"));
        }
        if self.hs_packet_size == 0 {
            return Err(ConfigError::ZeroPacketSize("high-speed bulk"));
        }
        if self.notify_packet_size == 0 {
            return Err(ConfigError::ZeroPacketSize("notification"));
        }
        if self.staging_len < usize::from(self.fs_packet_size) {
            return Err(ConfigError::StagingTooSmall {
                staging: self.staging_len,
                packet: self.fs_packet_size,
            });
        }

        let mut seen = Vec::with_capacity(NUM_PORTS * EndpointRole::ALL.len());
        for (_, role, ep) in self.endpoints.iter() {
            if endpoint_number(ep) == 0 {
                return Err(ConfigError::ControlEndpoint);
            }
            if is_in_endpoint(ep) != role.is_in() {
                let role = match role {
                    EndpointRole::BulkIn => "bulk IN",
                    EndpointRole::BulkOut => "bulk OUT",
                    EndpointRole::Notify => "notification IN",
                };
                return Err(ConfigError::EndpointDirection { ep, role });
            }
            if seen.contains(&ep) {
                return Err(ConfigError::DuplicateEndpoint(ep));
            }
            seen.push(ep);
        }

        let mut interfaces = Vec::with_capacity(NUM_PORTS * 2);
        for pair in &self.interfaces {
            for interface in [pair.comm, pair.data] {
                if interfaces.contains(&interface) {
                    return Err(ConfigError::DuplicateInterface(interface));
                }
                interfaces.push(interface);
            }
        }

        Ok(())
    }
}
