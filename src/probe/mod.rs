pub mod outcome;

pub use outcome::{NOT_AVAILABLE, ProbeOutcome};
