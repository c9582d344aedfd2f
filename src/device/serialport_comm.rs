use log::debug;
use std::io::{Read, Write};

use super::serial_comm::{SerialComm, SerialDriver};
use crate::{settings::SerialSettings, Result};

/// Opens ports through the serialport library
///
/// /dev/tty* or similar on unix-like systems
/// COM devices on Windows systems
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSerial;

impl SerialDriver for SystemSerial {
    type Port = SystemPort;

    fn open(&self, settings: &SerialSettings) -> Result<SystemPort> {
        debug!(
            "open: {} at {} baud ({})",
            settings.port_name,
            settings.baud_rate,
            settings.framing()
        );

        let device = serialport::new(settings.port_name.as_str(), settings.baud_rate)
            .timeout(settings.io_timeout)
            .parity(serialport::Parity::None)
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .open()?;

        Ok(SystemPort { device })
    }
}

/// A serial port opened by [SystemSerial]
pub struct SystemPort {
    device: Box<dyn serialport::SerialPort>,
}

impl SerialComm for SystemPort {
    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.device.write_all(data)?;
        Ok(self.device.flush()?)
    }

    fn read(&mut self, data: &mut [u8]) -> Result<usize> {
        Ok(self.device.read(data)?)
    }

    fn bytes_to_read(&mut self) -> Result<usize> {
        Ok(self.device.bytes_to_read()? as usize)
    }

    fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            device: self.device.try_clone()?,
        })
    }
}
