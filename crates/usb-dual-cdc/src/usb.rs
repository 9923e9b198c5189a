//! USB wire-level vocabulary shared by the class driver.

pub const USB_REQUEST_GET_INTERFACE: u8 = 0x0a;
pub const USB_REQUEST_SET_INTERFACE: u8 = 0x0b;

pub const USB_DESCRIPTOR_TYPE_CONFIGURATION: u8 = 0x02;
pub const USB_DESCRIPTOR_TYPE_INTERFACE: u8 = 0x04;
pub const USB_DESCRIPTOR_TYPE_ENDPOINT: u8 = 0x05;
pub const USB_DESCRIPTOR_TYPE_DEVICE_QUALIFIER: u8 = 0x06;
pub const USB_DESCRIPTOR_TYPE_INTERFACE_ASSOCIATION: u8 = 0x0b;

/// Direction bit of an endpoint address (set for IN endpoints).
pub const USB_ENDPOINT_DIR_IN: u8 = 0x80;

/// 8-byte SETUP packet as delivered by the link layer for endpoint 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SetupPacket {
    pub bm_request_type: u8,
    pub b_request: u8,
    pub w_value: u16,
    pub w_index: u16,
    pub w_length: u16,
}

impl SetupPacket {
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        Self {
            bm_request_type: bytes[0],
            b_request: bytes[1],
            w_value: u16::from_le_bytes([bytes[2], bytes[3]]),
            w_index: u16::from_le_bytes([bytes[4], bytes[5]]),
            w_length: u16::from_le_bytes([bytes[6], bytes[7]]),
        }
    }

    pub fn to_bytes(self) -> [u8; 8] {
        let value = self.w_value.to_le_bytes();
        let index = self.w_index.to_le_bytes();
        let length = self.w_length.to_le_bytes();
        [
            self.bm_request_type,
            self.b_request,
            value[0],
            value[1],
            index[0],
            index[1],
            length[0],
            length[1],
        ]
    }

    pub fn request_direction(&self) -> RequestDirection {
        if (self.bm_request_type & 0x80) != 0 {
            RequestDirection::DeviceToHost
        } else {
            RequestDirection::HostToDevice
        }
    }

    pub fn request_type(&self) -> RequestType {
        match (self.bm_request_type >> 5) & 0x03 {
            0 => RequestType::Standard,
            1 => RequestType::Class,
            2 => RequestType::Vendor,
            _ => RequestType::Reserved,
        }
    }

    pub fn recipient(&self) -> RequestRecipient {
        match self.bm_request_type & 0x1f {
            0 => RequestRecipient::Device,
            1 => RequestRecipient::Interface,
            2 => RequestRecipient::Endpoint,
            3 => RequestRecipient::Other,
            _ => RequestRecipient::Reserved,
        }
    }

    /// Interface number addressed by an interface-recipient request (low byte of `wIndex`).
    pub fn interface_number(&self) -> u8 {
        (self.w_index & 0x00ff) as u8
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestDirection {
    HostToDevice,
    DeviceToHost,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestType {
    Standard,
    Class,
    Vendor,
    Reserved,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestRecipient {
    Device,
    Interface,
    Endpoint,
    Other,
    Reserved,
}

/// Bus speed negotiated by the link layer before the configuration is selected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UsbSpeed {
    Low,
    #[default]
    Full,
    High,
}

/// Transfer type of a non-control endpoint opened by this driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndpointKind {
    Bulk,
    Interrupt,
}

impl EndpointKind {
    /// `bmAttributes` transfer-type bits for an endpoint descriptor.
    pub fn attributes(self) -> u8 {
        match self {
            EndpointKind::Bulk => 0x02,
            EndpointKind::Interrupt => 0x03,
        }
    }
}
