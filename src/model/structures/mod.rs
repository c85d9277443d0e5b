pub mod prior_policy;
pub mod star_rating;
pub mod update_scope;
