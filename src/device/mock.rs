//! A simulated serial driver for exercising transports without hardware

use std::{
    collections::VecDeque,
    io,
    sync::{Arc, Mutex, MutexGuard},
    thread,
    time::Duration,
};

use super::serial_comm::{SerialComm, SerialDriver};
use crate::{settings::SerialSettings, Error, Result};

#[derive(Default)]
pub struct MockState {
    /// Successful opens so far
    pub opens: usize,
    /// Ports with at least one live handle
    pub live_ports: usize,
    pub last_settings: Option<SerialSettings>,
    pub fail_open: bool,
    /// Every operation on an open handle fails, like a yanked USB adapter
    pub removed: bool,
    /// Writes fail while reads still work, as when the device goes away mid-write
    pub fail_writes: bool,
    /// Time each write blocks before it completes, outside the state lock
    pub write_delay: Duration,
    pub writes_started: usize,
    /// Bytes written, in order
    pub written: Vec<u8>,
    pub write_calls: usize,
    inbound: VecDeque<Vec<u8>>,
}

#[derive(Clone, Default)]
pub struct MockDriver {
    state: Arc<Mutex<MockState>>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    /// Queue bytes that arrive in the driver's input buffer as one burst
    pub fn push_inbound(&self, burst: &[u8]) {
        self.state().inbound.push_back(burst.to_vec());
    }

    pub fn remove_device(&self) {
        self.state().removed = true;
    }

    pub fn reattach_device(&self) {
        self.state().removed = false;
    }
}

impl SerialDriver for MockDriver {
    type Port = MockPort;

    fn open(&self, settings: &SerialSettings) -> Result<MockPort> {
        let mut state = self.state();
        if state.fail_open || state.removed {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such device").into());
        }
        state.opens += 1;
        state.live_ports += 1;
        state.last_settings = Some(settings.clone());

        Ok(MockPort {
            state: Arc::clone(&self.state),
            _token: Arc::new(PortToken {
                state: Arc::clone(&self.state),
            }),
        })
    }
}

struct PortToken {
    state: Arc<Mutex<MockState>>,
}

impl Drop for PortToken {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.live_ports -= 1;
        }
    }
}

pub struct MockPort {
    state: Arc<Mutex<MockState>>,
    _token: Arc<PortToken>,
}

impl MockPort {
    fn state(&self) -> Result<MutexGuard<'_, MockState>> {
        let state = self.state.lock().unwrap();
        if state.removed {
            Err(Error::IO(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "device removed",
            )))
        } else {
            Ok(state)
        }
    }
}

impl SerialComm for MockPort {
    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let delay = {
            let mut state = self.state()?;
            state.writes_started += 1;
            if state.fail_writes {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "write failed").into());
            }
            state.write_delay
        };
        if !delay.is_zero() {
            thread::sleep(delay);
        }

        let mut state = self.state()?;
        state.write_calls += 1;
        state.written.extend_from_slice(data);
        Ok(())
    }

    fn read(&mut self, data: &mut [u8]) -> Result<usize> {
        let mut state = self.state()?;
        let Some(mut burst) = state.inbound.pop_front() else {
            return Ok(0);
        };
        let n = burst.len().min(data.len());
        data[..n].copy_from_slice(&burst[..n]);
        if n < burst.len() {
            burst.drain(..n);
            state.inbound.push_front(burst);
        }
        Ok(n)
    }

    /// Reports one queued burst at a time so each burst is its own signal
    fn bytes_to_read(&mut self) -> Result<usize> {
        Ok(self.state()?.inbound.front().map_or(0, Vec::len))
    }

    fn try_clone(&self) -> Result<Self> {
        drop(self.state()?);
        Ok(Self {
            state: Arc::clone(&self.state),
            _token: Arc::clone(&self._token),
        })
    }
}
