use log::{debug, trace, warn};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use crate::{
    device::{SerialComm, SerialDriver, SystemSerial},
    settings::{Framing, SerialSettings, DEFAULT_BAUD_RATE},
    subscribers::{Handler, Subscribers, SubscriptionId},
    Error, ReceivedData, Result, Transport,
};

/// A [Transport] over a serial port
///
/// The port is opened with 8N1 framing at the configured baud rate. While connected, a delivery
/// thread named `serial-rx <port>` drains the driver's input buffer whenever bytes are waiting
/// and hands each drained burst to the subscribers. Handlers run on that thread.
///
/// All methods take `&self`, so one instance can be shared between threads. Concurrent
/// [send](Transport::send) calls are serialized; a [disconnect](Transport::disconnect) waits for
/// an in-flight write and then stops the delivery thread. Dropping the transport disconnects it.
pub struct SerialTransport<D: SerialDriver = SystemSerial> {
    driver: D,
    settings: Mutex<SerialSettings>,
    link: Mutex<Option<Link<D::Port>>>,
    subscribers: Arc<Subscribers>,
}

impl SerialTransport<SystemSerial> {
    /// Creates a transport for `port_name`; nothing is opened until [connect](Transport::connect)
    pub fn new(port_name: impl Into<String>, baud_rate: u32) -> Self {
        Self::from_settings(SerialSettings::new(port_name, baud_rate))
    }

    pub fn with_default_baud(port_name: impl Into<String>) -> Self {
        Self::new(port_name, DEFAULT_BAUD_RATE)
    }

    pub fn from_settings(settings: SerialSettings) -> Self {
        Self::with_driver(SystemSerial, settings)
    }
}

impl<D: SerialDriver> SerialTransport<D> {
    /// Creates a transport that opens its port through `driver`
    pub fn with_driver(driver: D, settings: SerialSettings) -> Self {
        Self {
            driver,
            settings: Mutex::new(settings),
            link: Mutex::new(None),
            subscribers: Arc::new(Subscribers::new()),
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn settings(&self) -> SerialSettings {
        self.lock_settings().clone()
    }

    pub fn port_name(&self) -> String {
        self.lock_settings().port_name.clone()
    }

    /// Changes the port used by the next [connect](Transport::connect)
    ///
    /// An open connection keeps using the port it was opened on.
    pub fn set_port_name(&self, port_name: impl Into<String>) {
        let port_name = port_name.into();
        if self.is_connected() {
            debug!("set_port_name: {:?} applies on next connect", port_name);
        }
        self.lock_settings().port_name = port_name;
    }

    pub fn baud_rate(&self) -> u32 {
        self.lock_settings().baud_rate
    }

    /// Changes the baud rate used by the next [connect](Transport::connect)
    pub fn set_baud_rate(&self, baud_rate: u32) {
        if self.is_connected() {
            debug!("set_baud_rate: {} applies on next connect", baud_rate);
        }
        self.lock_settings().baud_rate = baud_rate;
    }

    pub fn framing(&self) -> Framing {
        Framing
    }

    /// Like [connect](Transport::connect), but reports why the port could not be opened
    pub fn try_connect(&self) -> Result<()> {
        let settings = self.settings();
        if !settings.is_configured() {
            return Err(Error::NotConfigured);
        }
        if settings.baud_rate == 0 {
            return Err(Error::InvalidBaudRate(settings.baud_rate));
        }

        let stale = {
            let mut link = self.lock_link();
            if link.as_ref().is_some_and(Link::is_healthy) {
                trace!("connect: already connected to {}", settings.port_name);
                return Ok(());
            }
            link.take()
        };
        if let Some(stale) = stale {
            debug!("connect: discarding failed link to {}", stale.port_name);
            stale.close();
        }

        let mut link = self.lock_link();
        if link.as_ref().is_some_and(Link::is_healthy) {
            return Ok(());
        }
        let opened = Link::open(&self.driver, &settings, &self.subscribers)?;
        let replaced = link.replace(opened);
        drop(link);
        if let Some(replaced) = replaced {
            replaced.close();
        }

        debug!(
            "connect: opened {} at {} baud",
            settings.port_name, settings.baud_rate
        );
        Ok(())
    }

    /// Like [send](Transport::send), but reports why the write failed
    pub fn try_send(&self, data: &[u8]) -> Result<()> {
        let mut link = self.lock_link();
        let link = link
            .as_mut()
            .filter(|l| l.is_healthy())
            .ok_or(Error::NotConnected)?;

        if data.is_empty() {
            return Ok(());
        }

        trace!("send: {:02X?}", data);
        link.writer.write_all(data)
    }

    fn lock_settings(&self) -> MutexGuard<'_, SerialSettings> {
        self.settings.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_link(&self) -> MutexGuard<'_, Option<Link<D::Port>>> {
        self.link.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<D: SerialDriver> Transport for SerialTransport<D> {
    fn is_connected(&self) -> bool {
        self.lock_link().as_ref().is_some_and(Link::is_healthy)
    }

    fn connect(&self) -> bool {
        match self.try_connect() {
            Ok(()) => true,
            Err(Error::NotConfigured) => {
                debug!("connect: no port configured");
                false
            }
            Err(e) => {
                warn!("connect: could not open {:?}: {}", self.port_name(), e);
                false
            }
        }
    }

    fn disconnect(&self) {
        // taken out first so the delivery thread is joined without holding the lock
        let link = self.lock_link().take();
        match link {
            Some(link) => {
                let port_name = link.port_name.clone();
                link.close();
                debug!("disconnect: closed {}", port_name);
            }
            None => trace!("disconnect: not connected"),
        }
    }

    fn send(&self, data: &[u8]) -> bool {
        match self.try_send(data) {
            Ok(()) => true,
            Err(Error::NotConnected) => {
                debug!("send: not connected, dropping {} bytes", data.len());
                false
            }
            Err(e) => {
                warn!("send: write of {} bytes failed: {}", data.len(), e);
                false
            }
        }
    }

    fn subscribe(&self, handler: Handler) -> SubscriptionId {
        self.subscribers.subscribe(handler)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }
}

impl<D: SerialDriver> Drop for SerialTransport<D> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// An open port: the write handle plus the thread reading from a clone of it
///
/// The read handle sits in a slot shared with the delivery thread, so [close](Self::close) can
/// release it even when it runs on that thread and cannot join it.
struct Link<P> {
    port_name: String,
    writer: P,
    reader_port: Arc<Mutex<Option<P>>>,
    reader: JoinHandle<()>,
    running: Arc<AtomicBool>,
    healthy: Arc<AtomicBool>,
}

impl<P: SerialComm> Link<P> {
    fn open<D>(driver: &D, settings: &SerialSettings, subscribers: &Arc<Subscribers>) -> Result<Self>
    where
        D: SerialDriver<Port = P>,
    {
        let writer = driver.open(settings)?;
        let reader_port = Arc::new(Mutex::new(Some(writer.try_clone()?)));

        let running = Arc::new(AtomicBool::new(true));
        let healthy = Arc::new(AtomicBool::new(true));
        let receiver = Receiver {
            port: Arc::clone(&reader_port),
            running: Arc::clone(&running),
            healthy: Arc::clone(&healthy),
            subscribers: Arc::clone(subscribers),
            poll_interval: settings.poll_interval,
        };

        let reader = thread::Builder::new()
            .name(format!("serial-rx {}", settings.port_name))
            .spawn(move || receiver.run())?;

        Ok(Self {
            port_name: settings.port_name.clone(),
            writer,
            reader_port,
            reader,
            running,
            healthy,
        })
    }

    fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Acquire)
    }

    /// Stop the delivery thread and release both handles
    ///
    /// Both handles are dropped before this returns, so a following open never finds the old
    /// port still held.
    fn close(self) {
        let Link {
            port_name,
            writer,
            reader_port,
            reader,
            running,
            ..
        } = self;

        running.store(false, Ordering::Release);
        // waits for a drain in progress; the delivery thread never holds it while notifying
        drop(lock_port(&reader_port).take());
        drop(writer);

        if reader.thread().id() == thread::current().id() {
            // closing from inside a handler; the thread exits when the handler returns
            trace!("close: {} closed from its delivery thread", port_name);
            return;
        }
        if reader.join().is_err() {
            warn!("close: delivery thread for {} panicked", port_name);
        }
    }
}

fn lock_port<P>(port: &Mutex<Option<P>>) -> MutexGuard<'_, Option<P>> {
    port.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The delivery thread's side of a [Link]
struct Receiver<P> {
    port: Arc<Mutex<Option<P>>>,
    running: Arc<AtomicBool>,
    healthy: Arc<AtomicBool>,
    subscribers: Arc<Subscribers>,
    poll_interval: Duration,
}

impl<P: SerialComm> Receiver<P> {
    fn run(self) {
        trace!("receiver: started");

        while self.running.load(Ordering::Acquire) {
            match self.drain() {
                Ok(Some(data)) => {
                    trace!("receiver: got {:02X?}", data.as_bytes());
                    self.subscribers.notify(&data);
                }
                Ok(None) => thread::sleep(self.poll_interval),
                Err(e) if e.is_timeout() => thread::sleep(self.poll_interval),
                Err(e) => {
                    if self.running.load(Ordering::Acquire) {
                        warn!("receiver: read failed, link marked down: {}", e);
                    } else {
                        debug!("receiver: read failed while closing: {}", e);
                    }
                    self.healthy.store(false, Ordering::Release);
                    break;
                }
            }
        }

        // a faulted link still owns its handle until close
        drop(lock_port(&self.port).take());
        trace!("receiver: stopped");
    }

    /// Read everything currently waiting in the driver in a single read
    fn drain(&self) -> Result<Option<ReceivedData>> {
        let mut port = lock_port(&self.port);
        let Some(port) = port.as_mut() else {
            return Ok(None);
        };

        let available = port.bytes_to_read()?;
        if available == 0 {
            return Ok(None);
        }

        let mut buf = vec![0u8; available];
        let len = port.read(&mut buf)?;
        if len == 0 {
            return Ok(None);
        }
        buf.truncate(len);

        Ok(Some(ReceivedData::from(buf)))
    }
}
