pub type Result<T> = std::result::Result<T, Error>;

/// An error from a transport or the serial device underneath it
///
/// These never cross the [Transport](crate::Transport) boundary; they are logged there and
/// surface only through the `try_*` methods of [SerialTransport](crate::SerialTransport).
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The serial port could not be opened or configured
    #[error("Serial port error: `{0:?}`")]
    Serial(serialport::Error),

    /// A read, write or thread spawn failed
    #[error("IO error: `{0:?}`")]
    IO(std::io::Error),

    /// No port name is configured
    #[error("No serial port configured")]
    NotConfigured,

    /// The configured baud rate is not usable
    #[error("Invalid baud rate: `{0}`")]
    InvalidBaudRate(u32),

    /// The operation needs an open connection
    #[error("Transport is not connected")]
    NotConnected,
}

impl From<serialport::Error> for Error {
    fn from(e: serialport::Error) -> Self {
        Error::Serial(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IO(e)
    }
}

impl Error {
    /// Whether the error only means no data was ready before the driver's timeout
    pub(crate) fn is_timeout(&self) -> bool {
        match self {
            Error::IO(e) => e.kind() == std::io::ErrorKind::TimedOut,
            Error::Serial(e) => matches!(
                e.kind(),
                serialport::ErrorKind::Io(std::io::ErrorKind::TimedOut)
            ),
            _ => false,
        }
    }
}
