use serde_repr::{Deserialize_repr, Serialize_repr};
use std::convert::TryFrom;
use strum_macros::EnumIter;

/// A single raw vote value. Stored as its integer value.
#[derive(Deserialize_repr, Serialize_repr, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter)]
#[repr(u8)]
pub enum StarRating {
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5
}

impl StarRating {
    pub fn value(self) -> i32 {
        self as i32
    }
}

impl TryFrom<i32> for StarRating {
    type Error = ();

    fn try_from(v: i32) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(StarRating::One),
            2 => Ok(StarRating::Two),
            3 => Ok(StarRating::Three),
            4 => Ok(StarRating::Four),
            5 => Ok(StarRating::Five),
            _ => Err(())
        }
    }
}
