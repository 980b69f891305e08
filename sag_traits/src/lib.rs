pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// One analog reading in `[0, hardware_max]`.
pub type RawSample = u16;

pub trait Sensor {
    fn read(&mut self) -> Result<RawSample, Box<dyn std::error::Error + Send + Sync>>;
}

/// A text display that shows one complete frame per `draw` call.
///
/// Implementations must present `rows` as a unit: a caller never observes a
/// frame that mixes rows from two different `draw` calls.
pub trait Panel {
    fn draw(&mut self, rows: &[String]) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl<S: Sensor + ?Sized> Sensor for Box<S> {
    fn read(&mut self) -> Result<RawSample, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read()
    }
}

impl<P: Panel + ?Sized> Panel for Box<P> {
    fn draw(&mut self, rows: &[String]) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).draw(rows)
    }
}
