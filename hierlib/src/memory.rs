use std::fmt;
use std::io::Write;
use log::trace;
use serde::{Deserialize, Serialize};
use crate::error::SimError;

/// Anything a cache level can sit on top of: another cache level, or main memory
///
/// Addresses passed down are always block ids of the calling level
pub trait MemoryPort {
    fn read(&mut self, address: u64) -> Result<(), SimError>;
    fn write(&mut self, address: u64) -> Result<(), SimError>;
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryOp {
    #[serde(rename = "R")]
    Read,
    #[serde(rename = "W")]
    Write,
}

/// An access which fell through the whole hierarchy
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryEvent {
    pub op: MemoryOp,
    pub address: u64,
}

impl MemoryEvent {
    pub fn read(address: u64) -> Self {
        Self { op: MemoryOp::Read, address }
    }

    pub fn write(address: u64) -> Self {
        Self { op: MemoryOp::Write, address }
    }
}

/// Formats as the output line format, e.g. `R 0x00000100`
impl fmt::Display for MemoryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.op {
            MemoryOp::Read => 'R',
            MemoryOp::Write => 'W',
        };
        write!(f, "{op} {:#010x}", self.address)
    }
}

/// Main memory which remembers every access in call order, the basis for test oracles
#[derive(Debug, Default)]
pub struct RecordingRam {
    events: Vec<MemoryEvent>,
}

impl RecordingRam {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[MemoryEvent] {
        &self.events
    }

    /// Hands back the events recorded so far, leaving the log empty
    pub fn take_events(&mut self) -> Vec<MemoryEvent> {
        std::mem::take(&mut self.events)
    }

    /// The recorded events in the output line format
    pub fn lines(&self) -> Vec<String> {
        self.events.iter().map(|e| e.to_string()).collect()
    }
}

impl MemoryPort for RecordingRam {
    fn read(&mut self, address: u64) -> Result<(), SimError> {
        trace!("RAM: R {address:#010x}");
        self.events.push(MemoryEvent::read(address));
        Ok(())
    }

    fn write(&mut self, address: u64) -> Result<(), SimError> {
        trace!("RAM: W {address:#010x}");
        self.events.push(MemoryEvent::write(address));
        Ok(())
    }
}

/// Main memory which writes one line per access to a writer, usually stdout
///
/// Output is not flushed until [`WriterRam::into_inner`] is called, wrap unbuffered writers in a
/// `BufWriter`
pub struct WriterRam<W: Write> {
    writer: W,
}

impl<W: Write> WriterRam<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Flushes and returns the underlying writer
    pub fn into_inner(mut self) -> Result<W, SimError> {
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn emit(&mut self, event: MemoryEvent) -> Result<(), SimError> {
        trace!("RAM: {event}");
        writeln!(self.writer, "{event}")?;
        Ok(())
    }
}

impl<W: Write> MemoryPort for WriterRam<W> {
    fn read(&mut self, address: u64) -> Result<(), SimError> {
        self.emit(MemoryEvent::read(address))
    }

    fn write(&mut self, address: u64) -> Result<(), SimError> {
        self.emit(MemoryEvent::write(address))
    }
}

/// Main memory which discards every access, for when only the statistics matter
#[derive(Debug, Default, Copy, Clone)]
pub struct NullRam;

impl MemoryPort for NullRam {
    fn read(&mut self, _address: u64) -> Result<(), SimError> {
        Ok(())
    }

    fn write(&mut self, _address: u64) -> Result<(), SimError> {
        Ok(())
    }
}
