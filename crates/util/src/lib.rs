pub mod normalize;
pub mod paths;
pub mod redaction;

pub use normalize::*;
pub use paths::*;
pub use redaction::*;
