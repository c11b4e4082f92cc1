use thiserror::Error;

use crate::items::Family;
use crate::strategy::Mode;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("{strategy} expects {expected} items, got {got} items")]
    ShapeMismatch {
        strategy: Mode,
        expected: Family,
        got: Family,
    },

    #[error("unknown balancer mode: {0}")]
    UnknownMode(String),
}

impl Error {
    pub fn shape_mismatch(strategy: Mode, got: Family) -> Self {
        Self::ShapeMismatch {
            strategy,
            expected: strategy.family(),
            got,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
