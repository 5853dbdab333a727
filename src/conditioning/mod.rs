//! Series conditioning: gap filling, outlier treatment, categorical repair
//! and rescaling.
//!
//! Every function here is a pure transform over one series in its natural
//! (row) order and returns a new series plus the counts the run report needs.

pub mod categorical;
pub mod clip;
pub mod interpolate;
pub mod normalize;

pub use categorical::{Category, Repair, backfill};
pub use clip::{ClipBounds, Clipped, FixedBoundClipper, OutlierTreatment, StatisticalClipper};
pub use interpolate::{AllMissing, interpolate_linear};
pub use normalize::{DegenerateScale, ScaleMethod, ScalePolicy, min_max, z_score};
