//! Calibration inputs and outputs: quotes, latent states and
//! predictor-response weight constraints.

pub mod constraint;
pub mod quote;

pub use constraint::{discount_latent_state_prwc, PredictorResponseWeightConstraint};
pub use quote::{BasisLeg, LatentState, ProductQuoteSet, Quote, QuoteKind};
