//! Rating mathematics: the corpus prior, the weighted score and the batch
//! and inspection passes built on top of them.
pub mod batch;
pub mod constants;
pub mod inspect;
pub mod parameters;
pub mod prior;
pub mod structures;
pub mod weighted;

pub use batch::{BatchReport, BatchUpdater, RecipeUpdate, UpdateStatus};
pub use parameters::RatingParameters;
