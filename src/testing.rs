//! In-memory USB bus for unit tests.

use std::cell::{RefCell, RefMut};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use crate::device::usb::{UsbBus, UsbDevice};
use crate::error::{CoolerError, Result};

/// How `open` behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenBehavior {
    Present,
    NotFound,
    AccessDenied,
    Busy,
}

/// Hardware-side calls, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Detach,
    Attach,
    Claim,
    Release,
    Write(Vec<u8>),
    Read,
}

#[derive(Debug)]
pub struct FakeState {
    pub open: OpenBehavior,
    pub driver_active: bool,
    pub detach_error: Option<rusb::Error>,
    pub attach_error: Option<rusb::Error>,
    pub claim_error: Option<rusb::Error>,
    pub release_error: Option<rusb::Error>,
    /// Queued write results; an empty queue writes the whole buffer.
    pub writes: VecDeque<rusb::Result<usize>>,
    /// Queued read results; an empty queue times out.
    pub reads: VecDeque<rusb::Result<Vec<u8>>>,
    pub events: Vec<Event>,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            open: OpenBehavior::Present,
            driver_active: false,
            detach_error: None,
            attach_error: None,
            claim_error: None,
            release_error: None,
            writes: VecDeque::new(),
            reads: VecDeque::new(),
            events: Vec::new(),
        }
    }
}

/// Cloning shares state, so a test can keep a handle after the transport
/// takes ownership of its copy.
#[derive(Debug, Clone, Default)]
pub struct FakeBus {
    state: Rc<RefCell<FakeState>>,
}

impl FakeBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_open(open: OpenBehavior) -> Self {
        let bus = Self::new();
        bus.state().open = open;
        bus
    }

    pub fn state(&self) -> RefMut<'_, FakeState> {
        self.state.borrow_mut()
    }

    pub fn push_write(&self, result: rusb::Result<usize>) {
        self.state().writes.push_back(result);
    }

    pub fn push_read(&self, result: rusb::Result<Vec<u8>>) {
        self.state().reads.push_back(result);
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.borrow().events.clone()
    }

    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.state.borrow().events.iter().filter(|e| pred(*e)).count()
    }

    /// Every frame written so far.
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.state
            .borrow()
            .events
            .iter()
            .filter_map(|e| match e {
                Event::Write(bytes) => Some(bytes.clone()),
                _ => None,
            })
            .collect()
    }
}

impl UsbBus for FakeBus {
    type Device = FakeDevice;

    fn open(&self, _vendor_id: u16, _product_id: u16) -> Result<FakeDevice> {
        match self.state.borrow().open {
            OpenBehavior::Present => Ok(FakeDevice {
                state: Rc::clone(&self.state),
            }),
            OpenBehavior::NotFound => Err(CoolerError::NotFound),
            OpenBehavior::AccessDenied => Err(CoolerError::AccessDenied),
            OpenBehavior::Busy => Err(CoolerError::AlreadyClaimed),
        }
    }
}

#[derive(Debug)]
pub struct FakeDevice {
    state: Rc<RefCell<FakeState>>,
}

impl FakeDevice {
    fn record(&self, event: Event, error: Option<rusb::Error>) -> rusb::Result<()> {
        let mut state = self.state.borrow_mut();
        state.events.push(event);
        error.map_or(Ok(()), Err)
    }
}

impl UsbDevice for FakeDevice {
    fn kernel_driver_active(&self, _interface: u8) -> rusb::Result<bool> {
        Ok(self.state.borrow().driver_active)
    }

    fn detach_kernel_driver(&mut self, _interface: u8) -> rusb::Result<()> {
        let error = self.state.borrow().detach_error;
        if let Some(e) = error {
            return Err(e);
        }
        self.record(Event::Detach, None)
    }

    fn attach_kernel_driver(&mut self, _interface: u8) -> rusb::Result<()> {
        let error = self.state.borrow().attach_error;
        self.record(Event::Attach, error)
    }

    fn claim_interface(&mut self, _interface: u8) -> rusb::Result<()> {
        let error = self.state.borrow().claim_error;
        if let Some(e) = error {
            return Err(e);
        }
        self.record(Event::Claim, None)
    }

    fn release_interface(&mut self, _interface: u8) -> rusb::Result<()> {
        let error = self.state.borrow().release_error;
        self.record(Event::Release, error)
    }

    fn write_interrupt(&self, _endpoint: u8, buf: &[u8], _timeout: Duration) -> rusb::Result<usize> {
        let mut state = self.state.borrow_mut();
        let result = state.writes.pop_front().unwrap_or(Ok(buf.len()));
        if result.is_ok() {
            state.events.push(Event::Write(buf.to_vec()));
        }
        result
    }

    fn read_interrupt(
        &self,
        _endpoint: u8,
        buf: &mut [u8],
        _timeout: Duration,
    ) -> rusb::Result<usize> {
        let mut state = self.state.borrow_mut();
        state.events.push(Event::Read);
        let data = state.reads.pop_front().unwrap_or(Err(rusb::Error::Timeout))?;
        let len = data.len().min(buf.len());
        buf[..len].copy_from_slice(&data[..len]);
        Ok(len)
    }
}
