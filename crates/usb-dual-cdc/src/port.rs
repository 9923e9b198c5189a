use core::fmt;

/// Number of logical serial ports multiplexed over the controller.
pub const NUM_PORTS: usize = 2;

/// One of the two logical CDC-ACM serial ports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Port {
    Port0 = 0,
    Port1 = 1,
}

impl Port {
    pub const ALL: [Port; NUM_PORTS] = [Port::Port0, Port::Port1];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Port::Port0),
            1 => Some(Port::Port1),
            _ => None,
        }
    }

    /// The port sharing the controller with this one.
    pub const fn other(self) -> Self {
        match self {
            Port::Port0 => Port::Port1,
            Port::Port1 => Port::Port0,
        }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cdc{}", self.index())
    }
}
