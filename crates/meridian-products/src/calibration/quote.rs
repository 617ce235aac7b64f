//! Market quotes and latent states.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ProductError, ProductResult};

/// Leg of a basis swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BasisLeg {
    /// The leg the spread is quoted against.
    Reference,
    /// The leg whose forward curve is being solved.
    Derived,
}

impl BasisLeg {
    /// Manifest measure of a basis spread quoted on this leg.
    #[must_use]
    pub fn spread_measure(self) -> &'static str {
        match self {
            BasisLeg::Reference => "ReferenceParBasisSpread",
            BasisLeg::Derived => "DerivedParBasisSpread",
        }
    }
}

/// A market quote on a calibration instrument.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Quote {
    /// Present value in currency units.
    Pv(f64),
    /// Coupon or par rate (decimal).
    Rate(f64),
    /// Par swap rate (decimal).
    SwapRate(f64),
    /// Forward rate of a single period (decimal).
    ForwardRate(f64),
    /// Price, e.g. `97.5` for a rate future.
    Price(f64),
    /// Basis spread in basis points quoted on one leg.
    ParBasisSpread {
        /// Leg the spread applies to.
        leg: BasisLeg,
        /// Spread in basis points.
        spread_bp: f64,
    },
}

/// Discriminant of a [`Quote`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuoteKind {
    /// [`Quote::Pv`]
    Pv,
    /// [`Quote::Rate`]
    Rate,
    /// [`Quote::SwapRate`]
    SwapRate,
    /// [`Quote::ForwardRate`]
    ForwardRate,
    /// [`Quote::Price`]
    Price,
    /// [`Quote::ParBasisSpread`]
    ParBasisSpread,
}

impl Quote {
    /// Kind of the quote.
    #[must_use]
    pub fn kind(&self) -> QuoteKind {
        match self {
            Quote::Pv(_) => QuoteKind::Pv,
            Quote::Rate(_) => QuoteKind::Rate,
            Quote::SwapRate(_) => QuoteKind::SwapRate,
            Quote::ForwardRate(_) => QuoteKind::ForwardRate,
            Quote::Price(_) => QuoteKind::Price,
            Quote::ParBasisSpread { .. } => QuoteKind::ParBasisSpread,
        }
    }

    /// Manifest measure name the quote is recorded under.
    #[must_use]
    pub fn measure_name(&self) -> &'static str {
        match self {
            Quote::Pv(_) => "PV",
            Quote::Rate(_) => "Rate",
            Quote::SwapRate(_) => "SwapRate",
            Quote::ForwardRate(_) => "ForwardRate",
            Quote::Price(_) => "Price",
            Quote::ParBasisSpread { leg, .. } => leg.spread_measure(),
        }
    }

    /// Quoted number.
    #[must_use]
    pub fn value(&self) -> f64 {
        match *self {
            Quote::Pv(v) | Quote::Rate(v) | Quote::SwapRate(v) | Quote::ForwardRate(v) | Quote::Price(v) => v,
            Quote::ParBasisSpread { spread_bp, .. } => spread_bp,
        }
    }
}

/// The curve a constraint calibrates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LatentState {
    /// Discount factors of the funding curve.
    Funding,
    /// Forward rates of an index.
    Forward,
}

impl fmt::Display for LatentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LatentState::Funding => write!(f, "Funding"),
            LatentState::Forward => write!(f, "Forward"),
        }
    }
}

/// Quotes attached to one instrument.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductQuoteSet {
    quotes: Vec<Quote>,
}

impl ProductQuoteSet {
    /// Creates an empty quote set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Quote set holding a single quote.
    #[must_use]
    pub fn single(quote: Quote) -> Self {
        Self { quotes: vec![quote] }
    }

    /// Adds a quote.
    #[must_use]
    pub fn with(mut self, quote: Quote) -> Self {
        self.quotes.push(quote);
        self
    }

    /// Quotes in insertion order.
    #[must_use]
    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    /// The single quote whose kind is in `accepted`.
    ///
    /// Fails with `QuoteTypeMismatch` when none or more than one match.
    pub fn select(&self, accepted: &[QuoteKind], instrument: &str) -> ProductResult<Quote> {
        let mut matching = self.quotes.iter().filter(|q| accepted.contains(&q.kind()));
        match (matching.next(), matching.next()) {
            (Some(quote), None) => Ok(*quote),
            (None, _) => Err(ProductError::quote_mismatch(
                instrument,
                format!("no quote of kind {accepted:?}"),
            )),
            (Some(_), Some(_)) => Err(ProductError::quote_mismatch(
                instrument,
                format!("more than one quote of kind {accepted:?}"),
            )),
        }
    }
}
