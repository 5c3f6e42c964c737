pub mod client;
pub mod session;
pub mod source;
pub mod types;

#[cfg(test)]
pub(crate) mod fake;

pub use client::*;
pub use session::*;
pub use source::*;
pub use types::*;
