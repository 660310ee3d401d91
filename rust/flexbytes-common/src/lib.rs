//! Core definitions (errors and result alias), relied upon by all flexbytes-* crates.

pub mod error;
pub mod result;

pub use error::{Error, ErrorKind};
pub use result::Result;
