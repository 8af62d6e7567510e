pub mod stage0_units;
pub mod stage1_score;
pub mod stage2_reorder;
pub mod stage3_constrain;
pub mod stage4_dedup;
pub mod stage5_compete;

pub use stage0_units::*;
pub use stage1_score::*;
pub use stage2_reorder::*;
pub use stage3_constrain::*;
pub use stage4_dedup::*;
pub use stage5_compete::*;
