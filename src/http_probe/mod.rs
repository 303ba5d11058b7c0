pub mod probe;
pub mod result;

pub mod prelude {
    pub use super::probe::{build_client, fetch_once};
    pub use super::result::download_speed_kbps;
}

use std::fmt::Write;

/// Render an error together with its whole `source()` chain on one line.
pub fn report(mut err: &(dyn std::error::Error + 'static)) -> String {
    let mut s = format!("{}", err);
    while let Some(src) = err.source() {
        let _ = write!(s, ": caused by: {}", src);
        err = src;
    }
    s
}
