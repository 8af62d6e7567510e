pub mod client;
pub mod prompts;
pub mod scorer;
pub mod validation;

pub use client::*;
pub use prompts::*;
pub use scorer::*;
pub use validation::*;
