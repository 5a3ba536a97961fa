//! Logging statistics from training runs
mod display;

pub use display::DisplayLogger;

use std::io;
use thiserror::Error;

/// Training run events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    /// A completed episode.
    Episode,
    /// The end of a training run.
    Run,
}

/// A value that can be logged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Loggable {
    /// Nothing. No data to log.
    /// Logging Nothing data may still produce a placeholder entry for the name.
    Nothing,
    /// A scalar value.
    Scalar(f64),
    /// A count or an index, such as an episode number.
    Index(u64),
}

impl Loggable {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Nothing => "nothing",
            Self::Scalar(_) => "scalar",
            Self::Index(_) => "index",
        }
    }
}

impl From<f64> for Loggable {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<u64> for Loggable {
    fn from(value: u64) -> Self {
        Self::Index(value)
    }
}

impl From<usize> for Loggable {
    #[allow(clippy::cast_possible_truncation)]
    fn from(value: usize) -> Self {
        Self::Index(value as u64)
    }
}

/// Log statistics from a training run.
pub trait Logger {
    /// Log a value.
    ///
    /// # Args
    /// * `event` - The event associated with this value.
    /// * `name` - The name that identifies this value.
    /// * `value` - The value to log.
    ///
    /// # Returns
    /// May return an error if the logged value is structurally incompatible
    /// with previous values logged under the same name.
    fn log(&mut self, event: Event, name: &'static str, value: Loggable) -> Result<(), LogError>;

    /// Mark the end of an event.
    ///
    /// Loggers that write output do so here.
    fn done(&mut self, event: Event) -> Result<(), LogError>;
}

/// Logger that does nothing
impl Logger for () {
    fn log(&mut self, _: Event, _: &'static str, _: Loggable) -> Result<(), LogError> {
        Ok(())
    }

    fn done(&mut self, _: Event) -> Result<(), LogError> {
        Ok(())
    }
}

impl<T: Logger + ?Sized> Logger for &mut T {
    fn log(&mut self, event: Event, name: &'static str, value: Loggable) -> Result<(), LogError> {
        T::log(self, event, name, value)
    }

    fn done(&mut self, event: Event) -> Result<(), LogError> {
        T::done(self, event)
    }
}

/// Log to both loggers of a pair.
impl<A: Logger, B: Logger> Logger for (A, B) {
    fn log(&mut self, event: Event, name: &'static str, value: Loggable) -> Result<(), LogError> {
        self.0.log(event, name, value)?;
        self.1.log(event, name, value)
    }

    fn done(&mut self, event: Event) -> Result<(), LogError> {
        self.0.done(event)?;
        self.1.done(event)
    }
}

/// Logger that stores every entry in memory.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MemoryLogger {
    /// Logged values in order.
    pub entries: Vec<(Event, &'static str, Loggable)>,
    /// Completed events in order.
    pub completed: Vec<Event>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// All values logged under `name` for `event`, in order.
    pub fn values<'a>(
        &'a self,
        event: Event,
        name: &'a str,
    ) -> impl Iterator<Item = Loggable> + 'a {
        self.entries
            .iter()
            .filter(move |(e, n, _)| *e == event && *n == name)
            .map(|(_, _, v)| *v)
    }
}

impl Logger for MemoryLogger {
    fn log(&mut self, event: Event, name: &'static str, value: Loggable) -> Result<(), LogError> {
        self.entries.push((event, name, value));
        Ok(())
    }

    fn done(&mut self, event: Event) -> Result<(), LogError> {
        self.completed.push(event);
        Ok(())
    }
}

/// Logging error
#[derive(Debug, Error)]
pub enum LogError {
    #[error("\"{name}\": incompatible value {value:?}, expected {expected}")]
    IncompatibleValue {
        name: &'static str,
        value: Loggable,
        expected: &'static str,
    },
    #[error("failed to write log output")]
    Io(#[from] io::Error),
}
