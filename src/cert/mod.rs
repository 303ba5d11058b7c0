pub mod inspector;
pub mod result;

pub use inspector::CertInspector;
pub use result::{CertificateInfo, CertificateStatus};
