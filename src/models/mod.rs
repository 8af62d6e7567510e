pub mod candidate;
pub mod clip;
pub mod transcript;
pub mod unit;

pub use candidate::*;
pub use clip::*;
pub use transcript::*;
pub use unit::*;
