//! Host backend implementations (§6.1).

pub mod test;

#[cfg(feature = "terminal")]
pub mod terminal;
