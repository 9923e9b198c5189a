//! USB device class driver exposing two independent CDC-ACM serial ports over one controller.
//!
//! Each port owns a bulk IN/OUT pair and an interrupt IN notification endpoint; both share
//! endpoint 0. [`DualCdc`] sits between the link layer ([`UsbLink`], which owns the transceiver
//! and enumeration) and a [`CdcBackend`] that implements the byte streams and class requests of
//! the two ports. Every link-layer event is resolved to the port it belongs to and drives that
//! port's transfer state; class requests from either port are serialized through one shared
//! staging buffer.
//!
//! All entry points run to completion on the caller's thread and assume they are not re-entered.
//! Use [`DualCdcHandle`] when event delivery and application code need to share the driver.

mod backend;
pub mod cdc;
mod class;
pub mod config;
mod control;
pub mod descriptors;
pub mod endpoints;
mod error;
mod link;
mod port;
mod state;
mod transfer;
pub mod usb;

pub use crate::backend::{CdcBackend, ClassRequest};
pub use crate::class::{DualCdc, DualCdcHandle};
pub use crate::config::CdcConfig;
pub use crate::endpoints::{EndpointMap, EndpointRole, PortEndpoints};
pub use crate::error::{CdcError, ConfigError, Result};
pub use crate::link::{LinkEvent, UsbLink};
pub use crate::port::{Port, NUM_PORTS};
pub use crate::transfer::PortIo;
pub use crate::usb::{SetupPacket, UsbSpeed};
