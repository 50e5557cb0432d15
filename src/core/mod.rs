pub mod error;
pub mod types;

pub use error::{KvError, Result};
pub use types::{Handle, Key, ReadView, Value, Version};
