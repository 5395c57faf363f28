pub mod cancel;
pub mod job;
pub mod scope;
pub mod scoring;

pub use cancel::CancelSignal;
