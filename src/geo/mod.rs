pub mod resolver;
pub mod result;

pub use resolver::GeoResolver;
pub use result::GeoInfo;
