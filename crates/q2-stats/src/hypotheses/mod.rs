//! Hypothesis tests over distributions

pub mod pairwise;
pub mod util;

pub use crate::stats::{Alternative, PValueApprox};
pub use pairwise::{mann_whitney_u, wilcoxon_srt};
pub use util::{set_pairwise_attrs, PairwiseDescription};
