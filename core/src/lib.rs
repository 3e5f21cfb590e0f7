#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Alpha diversity of ecological count data.
//!
//! This serves as the core library implementation for the `adiv` CLI, but can also be used as a
//! free-standing library for computing diversity indices of a single sample.
//!
//! # Overview
//!
//! The core struct is [`Counts`], a validated vector of per-taxon abundances. Non-phylogenetic
//! indices live in [`metric`], richness and coverage estimators in [`estimate`]. Faith's
//! phylogenetic diversity combines counts with a [`Tree`] and is found in [`phylo`].
//!
//! All functions are pure: they take validated inputs and return a scalar, or an error when the
//! input is structurally invalid. Degenerate but valid inputs, such as a sample without any
//! observations, produce `0` or `NaN` as documented on each function rather than an error.
//!
//! # Example
//!
//! ```
//! use adiv_core::{metric, Counts};
//!
//! let counts = Counts::new([0, 1, 1, 4, 2, 5, 2, 4, 1, 2]).expect("counts are non-negative");
//!
//! assert_eq!(metric::observed_otus(&counts), 9);
//! assert_eq!(metric::osd(&counts), (9, 3, 3));
//! assert!((metric::menhinick(&counts) - 9.0 / 22f64.sqrt()).abs() < 1e-12);
//! ```

#[cfg(test)]
#[macro_use]
pub(crate) mod approx;

pub mod counts;
pub use counts::Counts;

pub mod estimate;

pub mod metric;

pub mod phylo;
pub use phylo::faith_pd;

pub mod tree;
pub use tree::{NodeId, TipIndex, Tree};
