//! CDC / PSTN class constants and payload formats.
//!
//! The router passes class requests through without interpreting them; these definitions are
//! for backends that implement the serial-port semantics.

pub const USB_CLASS_CDC: u8 = 0x02;
pub const USB_CLASS_CDC_DATA: u8 = 0x0a;
pub const CDC_SUBCLASS_ACM: u8 = 0x02;
pub const CDC_PROTOCOL_AT: u8 = 0x01;

pub const CDC_DESCRIPTOR_TYPE_CS_INTERFACE: u8 = 0x24;
pub const CDC_FUNC_HEADER: u8 = 0x00;
pub const CDC_FUNC_CALL_MANAGEMENT: u8 = 0x01;
pub const CDC_FUNC_ACM: u8 = 0x02;
pub const CDC_FUNC_UNION: u8 = 0x06;

pub const CDC_SEND_ENCAPSULATED_COMMAND: u8 = 0x00;
pub const CDC_GET_ENCAPSULATED_RESPONSE: u8 = 0x01;
pub const CDC_SET_COMM_FEATURE: u8 = 0x02;
pub const CDC_GET_COMM_FEATURE: u8 = 0x03;
pub const CDC_CLEAR_COMM_FEATURE: u8 = 0x04;
pub const CDC_SET_LINE_CODING: u8 = 0x20;
pub const CDC_GET_LINE_CODING: u8 = 0x21;
pub const CDC_SET_CONTROL_LINE_STATE: u8 = 0x22;
pub const CDC_SEND_BREAK: u8 = 0x23;

pub const LINE_CODING_LEN: usize = 7;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopBits {
    One = 0,
    OnePointFive = 1,
    Two = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parity {
    None = 0,
    Odd = 1,
    Even = 2,
    Mark = 3,
    Space = 4,
}

/// Payload of `SET_LINE_CODING` / `GET_LINE_CODING`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineCoding {
    pub data_rate: u32,
    pub stop_bits: StopBits,
    pub parity: Parity,
    pub data_bits: u8,
}

impl Default for LineCoding {
    /// 115200 baud, 8N1.
    fn default() -> Self {
        Self {
            data_rate: 115_200,
            stop_bits: StopBits::One,
            parity: Parity::None,
            data_bits: 8,
        }
    }
}

impl LineCoding {
    /// Decodes the 7-byte wire format. Returns `None` for short payloads or unknown field
    /// encodings.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let bytes: &[u8; LINE_CODING_LEN] = bytes.get(..LINE_CODING_LEN)?.try_into().ok()?;
        let stop_bits = match bytes[4] {
            0 => StopBits::One,
            1 => StopBits::OnePointFive,
            2 => StopBits::Two,
            _ => return None,
        };
        let parity = match bytes[5] {
            0 => Parity::None,
            1 => Parity::Odd,
            2 => Parity::Even,
            3 => Parity::Mark,
            4 => Parity::Space,
            _ => return None,
        };
        let data_bits = bytes[6];
        if !matches!(data_bits, 5 | 6 | 7 | 8 | 16) {
            return None;
        }
        Some(Self {
            data_rate: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            stop_bits,
            parity,
            data_bits,
        })
    }

    pub fn to_bytes(self) -> [u8; LINE_CODING_LEN] {
        let rate = self.data_rate.to_le_bytes();
        [
            rate[0],
            rate[1],
            rate[2],
            rate[3],
            self.stop_bits as u8,
            self.parity as u8,
            self.data_bits,
        ]
    }
}

/// `wValue` of `SET_CONTROL_LINE_STATE`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ControlLineState {
    pub dtr: bool,
    pub rts: bool,
}

impl ControlLineState {
    pub fn from_value(value: u16) -> Self {
        Self {
            dtr: value & 0x0001 != 0,
            rts: value & 0x0002 != 0,
        }
    }
}
