//! Access to serial devices, below the [Transport](crate::Transport) layer

mod serial_comm;
pub use serial_comm::{SerialComm, SerialDriver};

mod serialport_comm;
pub use serialport_comm::{SystemPort, SystemSerial};

#[cfg(test)]
pub(crate) mod mock;
