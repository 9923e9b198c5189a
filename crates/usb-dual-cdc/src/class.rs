use alloc::rc::Rc;
use core::cell::{RefCell, RefMut};

use tracing::debug;

use crate::backend::CdcBackend;
use crate::config::CdcConfig;
use crate::control::ControlStage;
use crate::endpoints::EndpointRole;
use crate::error::{CdcError, Result};
use crate::link::{LinkEvent, UsbLink};
use crate::port::Port;
use crate::state::{ClassState, PortState};
use crate::usb::{SetupPacket, UsbSpeed};

extern crate alloc;

/// Two CDC-ACM serial ports sharing one USB device controller.
///
/// The class instance state (transfer state of both ports, backend contexts, control staging)
/// exists only between [`DualCdc::activate`] and [`DualCdc::deactivate`].
pub struct DualCdc<L, B: CdcBackend> {
    pub(crate) link: L,
    pub(crate) backend: Option<B>,
    pub(crate) config: CdcConfig,
    pub(crate) speed: UsbSpeed,
    pub(crate) state: Option<ClassState<B::Context>>,
}

impl<L: UsbLink, B: CdcBackend> DualCdc<L, B> {
    pub fn new(link: L) -> Self {
        Self {
            link,
            backend: None,
            config: CdcConfig::default(),
            speed: UsbSpeed::default(),
            state: None,
        }
    }

    pub fn with_config(link: L, config: CdcConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new(link)
        })
    }

    /// Installs the port backend used from the next activation on.
    ///
    /// Fails with [`CdcError::Busy`] while configured: the live port contexts belong to the
    /// installed backend until [`DualCdc::deactivate`] hands them back.
    pub fn register_backend(&mut self, backend: B) -> Result<()> {
        if self.state.is_some() {
            return Err(CdcError::Busy);
        }
        self.backend = Some(backend);
        Ok(())
    }

    /// Opens the six endpoints, creates the class instance state, initializes both port
    /// backends, and arms the first bulk OUT reception on each port.
    ///
    /// If the state cannot be allocated the endpoints stay open; the caller still owes a
    /// [`DualCdc::deactivate`].
    pub fn activate(&mut self, speed: UsbSpeed) -> Result<()> {
        if self.backend.is_none() {
            return Err(CdcError::NoBackend);
        }
        if self.state.is_some() {
            debug!("configuration re-selected, tearing down previous instance");
            self.deactivate();
        }

        let packet_size = self.config.bulk_packet_size(speed);
        for (port, role, ep) in self.config.endpoints.iter() {
            let max_packet = match role {
                EndpointRole::Notify => self.config.notify_packet_size,
                EndpointRole::BulkIn | EndpointRole::BulkOut => packet_size,
            };
            debug!(%port, ep, ?role, max_packet, "open endpoint");
            self.link.open_endpoint(ep, role.kind(), max_packet);
        }
        self.speed = speed;

        let rx_capacity = usize::from(packet_size);
        let mut ports = [PortState::new(rx_capacity)?, PortState::new(rx_capacity)?];
        let control = ControlStage::new(self.config.staging_len)?;

        let Some(backend) = self.backend.as_mut() else {
            return Err(CdcError::NoBackend);
        };
        let link = &mut self.link;
        let config = &self.config;
        let contexts = Port::ALL.map(|port| {
            let mut io = Self::port_io(
                link,
                *config.endpoints.port(port),
                packet_size,
                port,
                &mut ports[port.index()],
            );
            backend.init(port, &mut io)
        });

        for port in Port::ALL {
            Self::port_io(
                link,
                *config.endpoints.port(port),
                packet_size,
                port,
                &mut ports[port.index()],
            )
            .receive_packet();
        }

        self.state = Some(ClassState {
            ports,
            contexts,
            control,
        });
        debug!(?speed, "cdc class configured");
        Ok(())
    }

    /// Closes all six endpoints and, if the class instance exists, tears down both backends and
    /// drops it. Safe to call repeatedly.
    pub fn deactivate(&mut self) {
        for (_, _, ep) in self.config.endpoints.iter() {
            self.link.close_endpoint(ep);
        }

        let Some(state) = self.state.take() else {
            return;
        };
        if let Some(backend) = self.backend.as_mut() {
            let [ctx0, ctx1] = state.contexts;
            backend.deinit(ctx0);
            backend.deinit(ctx1);
        }
        debug!("cdc class deconfigured");
    }

    /// Dispatches one link-layer event to its handler.
    ///
    /// Only activation and the bulk completion events can fail; control events are never
    /// refused.
    pub fn handle_event(&mut self, event: LinkEvent) -> Result<()> {
        match event {
            LinkEvent::Configured(speed) => self.activate(speed),
            LinkEvent::Deconfigured => {
                self.deactivate();
                Ok(())
            }
            LinkEvent::Setup(setup) => {
                self.handle_setup(setup);
                Ok(())
            }
            LinkEvent::DataIn(ep) => self.handle_data_in(ep),
            LinkEvent::DataOut(ep) => self.handle_data_out(ep),
            LinkEvent::Ep0RxReady => {
                self.handle_ep0_rx_ready();
                Ok(())
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.state.is_some()
    }

    /// Speed passed to the most recent activation.
    pub fn speed(&self) -> UsbSpeed {
        self.speed
    }

    pub fn config(&self) -> &CdcConfig {
        &self.config
    }

    pub fn is_transmitting(&self, port: Port) -> bool {
        self.state
            .as_ref()
            .is_some_and(|state| state.ports[port.index()].tx.is_sending())
    }

    /// Length of the most recent OUT packet on `port`, as left by the backend.
    pub fn received_len(&self, port: Port) -> Option<usize> {
        self.state
            .as_ref()
            .map(|state| state.ports[port.index()].rx_len)
    }

    /// Receive buffer currently installed on `port`.
    pub fn receive_buffer(&self, port: Port) -> Option<&[u8]> {
        self.state
            .as_ref()
            .and_then(|state| state.ports[port.index()].rx_buffer.as_deref())
    }

    /// Port targeted by the most recent SETUP packet.
    pub fn active_control_port(&self) -> Option<Port> {
        self.state.as_ref().map(|state| state.control.active_port())
    }

    /// Opcode of the class request waiting for its data stage, if any.
    pub fn pending_control_request(&self) -> Option<u8> {
        self.state
            .as_ref()
            .and_then(|state| state.control.pending())
            .map(|pending| pending.opcode)
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn backend(&self) -> Option<&B> {
        self.backend.as_ref()
    }

    pub fn backend_mut(&mut self) -> Option<&mut B> {
        self.backend.as_mut()
    }

    /// Backend context of `port` while configured.
    pub fn context(&self, port: Port) -> Option<&B::Context> {
        self.state
            .as_ref()
            .map(|state| &state.contexts[port.index()])
    }
}

/// Shareable handle to a [`DualCdc`].
///
/// Every call borrows the whole class instance for its duration, which serializes event
/// handlers against application-side API calls. Backend callbacks already hold that borrow and
/// must use their [`crate::PortIo`] instead of the handle.
pub struct DualCdcHandle<L, B: CdcBackend>(Rc<RefCell<DualCdc<L, B>>>);

impl<L, B: CdcBackend> Clone for DualCdcHandle<L, B> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<L: UsbLink, B: CdcBackend> DualCdcHandle<L, B> {
    pub fn new(class: DualCdc<L, B>) -> Self {
        Self(Rc::new(RefCell::new(class)))
    }

    /// Exclusive access to the class for a sequence of calls.
    pub fn lock(&self) -> RefMut<'_, DualCdc<L, B>> {
        self.0.borrow_mut()
    }

    pub fn handle_event(&self, event: LinkEvent) -> Result<()> {
        self.0.borrow_mut().handle_event(event)
    }

    pub fn handle_setup(&self, setup: SetupPacket) {
        self.0.borrow_mut().handle_setup(setup);
    }

    pub fn set_transmit_buffer(&self, port: Port, data: Vec<u8>) -> Result<()> {
        self.0.borrow_mut().set_transmit_buffer(port, data)
    }

    pub fn set_receive_buffer(&self, port: Port, buf: Vec<u8>) -> Result<()> {
        self.0.borrow_mut().set_receive_buffer(port, buf)
    }

    pub fn transmit_packet(&self, port: Port) -> Result<()> {
        self.0.borrow_mut().transmit_packet(port)
    }

    pub fn receive_packet(&self, port: Port) -> Result<()> {
        self.0.borrow_mut().receive_packet(port)
    }

    pub fn is_configured(&self) -> bool {
        self.0.borrow().is_configured()
    }

    pub fn is_transmitting(&self, port: Port) -> bool {
        self.0.borrow().is_transmitting(port)
    }
}
