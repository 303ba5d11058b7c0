pub mod probe;
pub mod result;

pub use probe::PhaseProbe;
pub use result::PhaseTimings;
