pub mod fingerprint;
pub mod kind;
pub mod name;
pub mod posting;
pub mod tier;

mod error;

pub use error::{Error, Result};
