// src/core/mod.rs
pub mod access;
pub mod crypto;
pub mod envelope;
pub mod file;
pub mod seal;
pub mod util;

pub use access::*;
pub use envelope::*;
pub use file::*;
pub use seal::*;
pub use util::*;
