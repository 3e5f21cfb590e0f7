//! Non-phylogenetic alpha diversity indices.
//!
//! Each index is a pure function of a [`Counts`](crate::Counts) vector. Throughout, `n` refers
//! to the total count, `S` to the number of observed taxa (with count > 0), and `pᵢ` to the
//! relative abundance of taxon `i`.
//!
//! Samples without any observations are never an error. Richness-style indices such as
//! [`observed_otus`] return zero, whereas indices whose definition involves a ratio `0/0`, such
//! as [`shannon`] or [`pielou_e`], return NaN.

mod dominance;
pub use dominance::{
    berger_parker_d, dominance, enspie, gini_index, mcintosh_d, mcintosh_e, simpson, simpson_e,
    strong, GiniMethod,
};

mod entropy;
pub use entropy::{brillouin_d, heip_e, pielou_e, shannon, shannon_with_base, DEFAULT_BASE};

mod fisher;
pub use fisher::{fisher_alpha, FisherAlphaError};

mod richness;
pub use richness::{
    doubles, goods_coverage, kempton_taylor_q, kempton_taylor_q_with, margalef, menhinick,
    observed_otus, osd, robbins, singles,
};
