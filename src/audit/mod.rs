pub mod client;
pub mod normalize;
pub mod result;

pub use client::AuditClient;
pub use result::PagespeedReport;
