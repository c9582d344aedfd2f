use std::{fmt, time::Duration};

/// Baud rate used when none is given
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// How long the delivery thread sleeps when the driver reports no waiting bytes
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Upper bound on a single blocking read or write in the driver
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(1);

/// The serial line format: 8 data bits, no parity, one stop bit
///
/// This is the only format supported, so the type carries no data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Framing;

impl Framing {
    pub const DATA_BITS: u8 = 8;
    pub const STOP_BITS: u8 = 1;
}

impl fmt::Display for Framing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}N{}", Self::DATA_BITS, Self::STOP_BITS)
    }
}

/// Parameters used to open a serial port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    /// Device name, e.g. `/dev/ttyUSB0` or `COM3`
    pub port_name: String,
    pub baud_rate: u32,
    pub poll_interval: Duration,
    pub io_timeout: Duration,
}

impl SerialSettings {
    pub fn new(port_name: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate,
            poll_interval: DEFAULT_POLL_INTERVAL,
            io_timeout: DEFAULT_IO_TIMEOUT,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_io_timeout(mut self, io_timeout: Duration) -> Self {
        self.io_timeout = io_timeout;
        self
    }

    pub fn framing(&self) -> Framing {
        Framing
    }

    pub(crate) fn is_configured(&self) -> bool {
        !self.port_name.trim().is_empty()
    }
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self::new(String::new(), DEFAULT_BAUD_RATE)
    }
}
