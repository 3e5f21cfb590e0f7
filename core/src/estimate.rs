//! Richness and coverage estimators.
//!
//! Unlike the indices in [`metric`](crate::metric), which describe the sample at hand, these
//! estimate properties of the community the sample was drawn from.

mod ace;
pub use ace::{ace, AceError, DEFAULT_RARE_THRESHOLD};

mod chao1;
pub use chao1::chao1;

mod esty;
pub use esty::esty_ci;

pub mod michaelis_menten;
pub use michaelis_menten::{michaelis_menten_fit, FitError, MichaelisMenten};
