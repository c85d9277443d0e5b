// Rating constants
pub const MINIMUM_VOTES: u32 = 5;
pub const DEFAULT_GLOBAL_AVERAGE: f64 = 3.0;
pub const MIN_VOTE: i32 = 1;
pub const MAX_VOTE: i32 = 5;
pub const SCORE_DECIMALS: u32 = 2;
// The inspection report always smooths toward this value, regardless of policy
pub const INSPECTION_GLOBAL_AVERAGE: f64 = 3.0;
