//! Byte transports for talking to ModControl devices
//!
//! A [Transport] moves raw bytes to and from a device and tells subscribers when bytes arrive. It
//! does not interpret or frame them; protocol layers on top reassemble messages from the bursts
//! they are handed. [SerialTransport] is the serial port implementation.
//!
//! # Usage
//! ```no_run
//! use modlink::{ReceivedData, SerialTransport, Transport};
//!
//! let port = SerialTransport::new("/dev/ttyUSB0", 115_200);
//! port.subscribe(Box::new(|data: &ReceivedData| println!("got {:02X?}", data.as_bytes())));
//!
//! if port.connect() {
//!     port.send(&[0x01, 0x03, 0x00]);
//! }
//! port.disconnect();
//! ```

#![forbid(unsafe_code)]

pub mod device;

mod error;
pub use error::Error;
use error::Result;

mod serial_transport;
pub use serial_transport::SerialTransport;

pub mod settings;
pub use settings::{Framing, SerialSettings};

mod subscribers;
pub use subscribers::{Handler, Subscribers, SubscriptionId};

mod transport;
pub use transport::{ReceivedData, Transport};
