use crate::{settings::SerialSettings, Result};

/// An API to communicate with an open serial device
pub trait SerialComm: Send + Sized + 'static {
    fn write_all(&mut self, data: &[u8]) -> Result<()>;
    fn read(&mut self, data: &mut [u8]) -> Result<usize>;

    /// Number of bytes waiting in the driver's input buffer
    fn bytes_to_read(&mut self) -> Result<usize>;

    /// Open a second handle to the same device
    ///
    /// The transport reads on one handle and writes on the other; both refer to a single open
    /// port that closes once every handle is dropped.
    fn try_clone(&self) -> Result<Self>;
}

/// Opens [SerialComm] handles
pub trait SerialDriver: Send + Sync + 'static {
    type Port: SerialComm;

    /// Open the device named in `settings` with 8N1 framing
    fn open(&self, settings: &SerialSettings) -> Result<Self::Port>;
}
