pub mod align;
pub mod audit;
pub mod config;
pub mod error;
pub mod functions;
pub mod lint;
pub mod read;
pub mod rules;
pub mod statics;
pub mod types;
pub mod write;

pub use align::{align, missing_lines, Alignment, LOOKAHEAD};
pub use config::Config;
pub use error::{Error, Result};
pub use functions::{classify, normalize};
pub use types::*;
