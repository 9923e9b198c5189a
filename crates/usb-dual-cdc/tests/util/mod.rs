#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};

use usb_dual_cdc::usb::{EndpointKind, RequestDirection};
use usb_dual_cdc::{
    CdcBackend, ClassRequest, DualCdc, Port, PortIo, SetupPacket, UsbLink, UsbSpeed,
};

/// Everything the class asked of the link layer, in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkOp {
    Open {
        ep: u8,
        kind: EndpointKind,
        max_packet: u16,
    },
    Close(u8),
    Transmit {
        ep: u8,
        data: Vec<u8>,
    },
    PrepareReceive {
        ep: u8,
        max_len: usize,
    },
    ControlSend(Vec<u8>),
    ControlPrepareReceive(usize),
}

/// Link layer double: records requests and plays back queued OUT packets and EP0 data stages.
#[derive(Default)]
pub struct RecordingLink {
    pub ops: Vec<LinkOp>,
    out_packets: HashMap<u8, VecDeque<Vec<u8>>>,
    control_data: Option<Vec<u8>>,
}

impl RecordingLink {
    /// Queues a packet to be returned by the next `read_received` on `ep`.
    pub fn queue_out(&mut self, ep: u8, data: &[u8]) {
        self.out_packets.entry(ep).or_default().push_back(data.to_vec());
    }

    pub fn set_control_data(&mut self, data: &[u8]) {
        self.control_data = Some(data.to_vec());
    }

    pub fn take_ops(&mut self) -> Vec<LinkOp> {
        std::mem::take(&mut self.ops)
    }

    pub fn transmitted(&self) -> Vec<(u8, Vec<u8>)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                LinkOp::Transmit { ep, data } => Some((*ep, data.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn armed(&self) -> Vec<(u8, usize)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                LinkOp::PrepareReceive { ep, max_len } => Some((*ep, *max_len)),
                _ => None,
            })
            .collect()
    }

    pub fn control_sent(&self) -> Vec<Vec<u8>> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                LinkOp::ControlSend(data) => Some(data.clone()),
                _ => None,
            })
            .collect()
    }
}

impl UsbLink for RecordingLink {
    fn open_endpoint(&mut self, ep: u8, kind: EndpointKind, max_packet_size: u16) {
        self.ops.push(LinkOp::Open {
            ep,
            kind,
            max_packet: max_packet_size,
        });
    }

    fn close_endpoint(&mut self, ep: u8) {
        self.ops.push(LinkOp::Close(ep));
    }

    fn transmit(&mut self, ep: u8, data: &[u8]) {
        self.ops.push(LinkOp::Transmit {
            ep,
            data: data.to_vec(),
        });
    }

    fn prepare_receive(&mut self, ep: u8, max_len: usize) {
        self.ops.push(LinkOp::PrepareReceive { ep, max_len });
    }

    fn read_received(&mut self, ep: u8, buf: &mut [u8]) -> usize {
        let Some(packet) = self.out_packets.get_mut(&ep).and_then(VecDeque::pop_front) else {
            return 0;
        };
        let n = packet.len().min(buf.len());
        buf[..n].copy_from_slice(&packet[..n]);
        packet.len()
    }

    fn control_send(&mut self, data: &[u8]) {
        self.ops.push(LinkOp::ControlSend(data.to_vec()));
    }

    fn control_prepare_receive(&mut self, len: usize) {
        self.ops.push(LinkOp::ControlPrepareReceive(len));
    }

    fn read_control_data(&mut self, buf: &mut [u8]) -> usize {
        let Some(data) = self.control_data.take() else {
            return 0;
        };
        let n = data.len().min(buf.len());
        buf[..n].copy_from_slice(&data[..n]);
        n
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendCall {
    Init(Port),
    Deinit(Port),
    Control {
        port: Port,
        opcode: u8,
        value: u16,
        direction: RequestDirection,
        data: Vec<u8>,
    },
    Receive {
        port: Port,
        data: Vec<u8>,
    },
    TransmitComplete(Port),
}

#[derive(Debug)]
pub struct PortCtx {
    pub port: Port,
    pub received: usize,
}

/// Backend double: records every callback and optionally reacts through its [`PortIo`].
#[derive(Default)]
pub struct RecordingBackend {
    pub calls: Vec<BackendCall>,
    /// Bytes copied into device-to-host request payloads.
    pub reply: Vec<u8>,
    /// Receive buffer capacity installed from `init`.
    pub init_rx_capacity: Option<usize>,
    pub rearm_on_receive: bool,
    /// Length left behind by `receive` instead of the received count.
    pub consume_to: Option<usize>,
    /// Data transmitted again from `transmit_complete`.
    pub resend_on_complete: Option<Vec<u8>>,
}

impl RecordingBackend {
    pub fn control_calls(&self) -> Vec<&BackendCall> {
        self.calls
            .iter()
            .filter(|call| matches!(call, BackendCall::Control { .. }))
            .collect()
    }

    pub fn received(&self, port: Port) -> Vec<Vec<u8>> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::Receive { port: p, data } if *p == port => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn transmit_completions(&self, port: Port) -> usize {
        self.calls
            .iter()
            .filter(|call| **call == BackendCall::TransmitComplete(port))
            .count()
    }
}

impl CdcBackend for RecordingBackend {
    type Context = PortCtx;

    fn init(&mut self, port: Port, io: &mut PortIo<'_>) -> PortCtx {
        self.calls.push(BackendCall::Init(port));
        if let Some(capacity) = self.init_rx_capacity {
            io.set_receive_buffer(vec![0; capacity]);
        }
        PortCtx { port, received: 0 }
    }

    fn deinit(&mut self, ctx: PortCtx) {
        self.calls.push(BackendCall::Deinit(ctx.port));
    }

    fn control(&mut self, ctx: &mut PortCtx, io: &mut PortIo<'_>, request: ClassRequest<'_>) {
        assert_eq!(ctx.port, io.port());
        if request.direction == RequestDirection::DeviceToHost {
            let n = self.reply.len().min(request.data.len());
            request.data[..n].copy_from_slice(&self.reply[..n]);
        }
        self.calls.push(BackendCall::Control {
            port: ctx.port,
            opcode: request.opcode,
            value: request.value,
            direction: request.direction,
            data: request.data.to_vec(),
        });
    }

    fn receive(&mut self, ctx: &mut PortCtx, io: &mut PortIo<'_>, data: &[u8], len: &mut usize) {
        assert_eq!(ctx.port, io.port());
        assert_eq!(*len, data.len());
        ctx.received += data.len();
        self.calls.push(BackendCall::Receive {
            port: ctx.port,
            data: data.to_vec(),
        });
        if let Some(consumed) = self.consume_to {
            *len = consumed;
        }
        if self.rearm_on_receive {
            io.receive_packet();
        }
    }

    fn transmit_complete(&mut self, ctx: &mut PortCtx, io: &mut PortIo<'_>) {
        assert!(!io.is_transmitting());
        self.calls.push(BackendCall::TransmitComplete(ctx.port));
        if let Some(data) = self.resend_on_complete.take() {
            io.set_transmit_buffer(data).expect("port idle after completion");
            io.transmit_packet().expect("port idle after completion");
        }
    }
}

pub type TestCdc = DualCdc<RecordingLink, RecordingBackend>;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

pub fn new_cdc(backend: RecordingBackend) -> TestCdc {
    let mut cdc = DualCdc::new(RecordingLink::default());
    cdc.register_backend(backend).expect("not configured yet");
    cdc
}

/// Activated class with the activation's link ops and backend calls cleared.
pub fn configured_with(backend: RecordingBackend, speed: UsbSpeed) -> TestCdc {
    init_tracing();
    let mut cdc = new_cdc(backend);
    cdc.activate(speed).expect("activate");
    cdc.link_mut().take_ops();
    if let Some(backend) = cdc.backend_mut() {
        backend.calls.clear();
    }
    cdc
}

pub fn configured() -> TestCdc {
    configured_with(RecordingBackend::default(), UsbSpeed::Full)
}

pub fn backend(cdc: &TestCdc) -> &RecordingBackend {
    cdc.backend().expect("backend registered")
}

/// Class request addressed to `interface`.
pub fn class_request(
    direction_in: bool,
    request: u8,
    value: u16,
    interface: u8,
    len: u16,
) -> SetupPacket {
    SetupPacket {
        bm_request_type: if direction_in { 0xa1 } else { 0x21 },
        b_request: request,
        w_value: value,
        w_index: u16::from(interface),
        w_length: len,
    }
}
