//! Measure records and named measure maps.
//!
//! Valuation produces typed records ([`StreamMeasures`] with one
//! [`ChannelMeasures`] per [`ConvexityChannel`]). [`ValueMap`] flattens a
//! record into the case-insensitive `name -> value` form used by reporting
//! and by quote lookups.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use meridian_core::types::Date;

/// Case-insensitive map of named measures.
///
/// Lookups ignore ASCII case; iteration yields the spelling of the first
/// insertion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueMap {
    entries: BTreeMap<String, (String, f64)>,
}

impl ValueMap {
    /// Empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites a measure.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        let name = name.into();
        self.entries
            .entry(name.to_ascii_uppercase())
            .and_modify(|entry| entry.1 = value)
            .or_insert((name, value));
    }

    /// Value of a measure.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries.get(&name.to_ascii_uppercase()).map(|(_, v)| *v)
    }

    /// True if the measure is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_uppercase())
    }

    /// Number of measures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no measures are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(display name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.values().map(|(name, v)| (name.as_str(), *v))
    }

    /// Copies every measure of `other` with `prefix` prepended to its name.
    pub fn extend_prefixed(&mut self, prefix: &str, other: &ValueMap) {
        for (name, value) in other.iter() {
            self.insert(format!("{prefix}{name}"), value);
        }
    }
}

/// Convexity adjustment channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConvexityChannel {
    /// No adjustment.
    Unadjusted,
    /// Sub-period compounding.
    Compounding,
    /// Credit / forward.
    CreditForward,
    /// Credit / funding.
    CreditFunding,
    /// Credit / FX.
    CreditFx,
    /// Product of every adjustment; the headline channel.
    Cumulative,
    /// Forward / funding.
    ForwardFunding,
    /// Forward / FX.
    ForwardFx,
    /// Funding / FX.
    FundingFx,
}

impl ConvexityChannel {
    /// Every channel, in storage order.
    pub const ALL: [ConvexityChannel; 9] = [
        ConvexityChannel::Unadjusted,
        ConvexityChannel::Compounding,
        ConvexityChannel::CreditForward,
        ConvexityChannel::CreditFunding,
        ConvexityChannel::CreditFx,
        ConvexityChannel::Cumulative,
        ConvexityChannel::ForwardFunding,
        ConvexityChannel::ForwardFx,
        ConvexityChannel::FundingFx,
    ];

    /// Storage slot.
    #[must_use]
    pub fn slot(self) -> usize {
        self as usize
    }

    /// Short name, e.g. `ForwardFunding`.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ConvexityChannel::Unadjusted => "Unadjusted",
            ConvexityChannel::Compounding => "Compounding",
            ConvexityChannel::CreditForward => "CreditForward",
            ConvexityChannel::CreditFunding => "CreditFunding",
            ConvexityChannel::CreditFx => "CreditFX",
            ConvexityChannel::Cumulative => "Cumulative",
            ConvexityChannel::ForwardFunding => "ForwardFunding",
            ConvexityChannel::ForwardFx => "ForwardFX",
            ConvexityChannel::FundingFx => "FundingFX",
        }
    }

    /// Prefix of the channel's measure names.
    #[must_use]
    pub fn prefix(self) -> String {
        match self {
            ConvexityChannel::Unadjusted => "Unadjusted".to_string(),
            ConvexityChannel::Compounding => "CompoundingAdjusted".to_string(),
            other => format!("{}ConvexityAdjusted", other.name()),
        }
    }

    /// True for every channel except `Unadjusted`.
    #[must_use]
    pub fn is_adjusted(self) -> bool {
        self != ConvexityChannel::Unadjusted
    }
}

impl fmt::Display for ConvexityChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// PV and DV01 family of one convexity channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelMeasures {
    /// Dirty DV01 minus accrued DV01.
    pub clean_dv01: f64,
    /// Dirty PV minus accrued.
    pub clean_pv: f64,
    /// DV01 of the live cash flows as of the cash settle date.
    pub dirty_dv01: f64,
    /// PV of the live cash flows as of the cash settle date.
    pub dirty_pv: f64,
    /// `0.0001 * clean_pv / clean_dv01`.
    pub fair_premium: f64,
    /// Clean PV per unit of value-date notional.
    pub upfront: Option<f64>,
    /// Price from clean PV.
    pub clean_price: Option<f64>,
    /// Price from dirty PV.
    pub dirty_price: Option<f64>,
}

impl ChannelMeasures {
    fn write(&self, prefix: &str, map: &mut ValueMap) {
        map.insert(format!("{prefix}CleanDV01"), self.clean_dv01);
        map.insert(format!("{prefix}CleanPV"), self.clean_pv);
        map.insert(format!("{prefix}DirtyDV01"), self.dirty_dv01);
        map.insert(format!("{prefix}DirtyPV"), self.dirty_pv);
        map.insert(format!("{prefix}DV01"), self.dirty_dv01);
        map.insert(format!("{prefix}PV"), self.dirty_pv);
        map.insert(format!("{prefix}FairPremium"), self.fair_premium);
        map.insert(format!("{prefix}ParRate"), self.fair_premium);
        map.insert(format!("{prefix}Rate"), self.fair_premium);
        if let Some(upfront) = self.upfront {
            map.insert(format!("{prefix}Upfront"), upfront);
        }
        if let Some(price) = self.clean_price {
            map.insert(format!("{prefix}CleanPrice"), price);
        }
        if let Some(price) = self.dirty_price {
            map.insert(format!("{prefix}DirtyPrice"), price);
        }
    }
}

/// Every measure of one stream valuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamMeasures {
    channels: [ChannelMeasures; 9],
    /// Accrued coupon on the value date.
    pub accrued: f64,
    /// DV01 of the accrued coupon.
    pub accrued01: f64,
    /// Reset date of the first live period.
    pub reset_date: Date,
    /// Index fixing or forward (fixed coupon for fixed legs) of the first live period.
    pub reset_rate: f64,
    /// Full coupon rate of the first live period.
    pub total_coupon: f64,
    /// DV01 of the first live period.
    pub fixing01: f64,
    /// Discount factor to the cash settle date.
    pub cash_settle_df: f64,
    /// Wall-clock seconds spent valuing.
    pub calc_time: f64,
}

impl StreamMeasures {
    /// Assembles a record from per-channel measures in [`ConvexityChannel::ALL`] order.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        channels: [ChannelMeasures; 9],
        accrued: f64,
        accrued01: f64,
        reset_date: Date,
        reset_rate: f64,
        total_coupon: f64,
        fixing01: f64,
        cash_settle_df: f64,
    ) -> Self {
        Self {
            channels,
            accrued,
            accrued01,
            reset_date,
            reset_rate,
            total_coupon,
            fixing01,
            cash_settle_df,
            calc_time: 0.0,
        }
    }

    /// Measures of one channel.
    #[must_use]
    pub fn channel(&self, channel: ConvexityChannel) -> &ChannelMeasures {
        &self.channels[channel.slot()]
    }

    /// The headline (cumulative) channel.
    #[must_use]
    pub fn headline(&self) -> &ChannelMeasures {
        self.channel(ConvexityChannel::Cumulative)
    }

    /// Headline dirty PV.
    #[must_use]
    pub fn pv(&self) -> f64 {
        self.headline().dirty_pv
    }

    /// Headline dirty DV01.
    #[must_use]
    pub fn dv01(&self) -> f64 {
        self.headline().dirty_dv01
    }

    /// Headline clean PV.
    #[must_use]
    pub fn clean_pv(&self) -> f64 {
        self.headline().clean_pv
    }

    /// Headline clean DV01.
    #[must_use]
    pub fn clean_dv01(&self) -> f64 {
        self.headline().clean_dv01
    }

    /// Headline fair premium (par rate).
    #[must_use]
    pub fn fair_premium(&self) -> f64 {
        self.headline().fair_premium
    }

    /// Flattens the record into named measures.
    #[must_use]
    pub fn to_value_map(&self) -> ValueMap {
        let mut map = ValueMap::new();
        let unadjusted = self.channel(ConvexityChannel::Unadjusted);

        for channel in ConvexityChannel::ALL {
            let measures = self.channel(channel);
            measures.write(&channel.prefix(), &mut map);
            if channel.is_adjusted() {
                if unadjusted.dirty_pv != 0.0 {
                    map.insert(
                        format!("{}ConvexityAdjustmentFactor", channel.name()),
                        measures.dirty_pv / unadjusted.dirty_pv,
                    );
                }
                map.insert(
                    format!("{}ConvexityAdjustmentPremium", channel.name()),
                    measures.fair_premium - unadjusted.fair_premium,
                );
            }
        }

        let headline = self.headline();
        headline.write("", &mut map);
        map.insert("SwapRate", headline.fair_premium);
        if let Some(price) = headline.clean_price {
            map.insert("Price", price);
        }

        map.insert("Accrued", self.accrued);
        map.insert("Accrued01", self.accrued01);
        map.insert("ResetDate", self.reset_date.serial() as f64);
        map.insert("ResetRate", self.reset_rate);
        map.insert("TotalCoupon", self.total_coupon);
        map.insert("Fixing01", self.fixing01);
        map.insert("CashSettleDF", self.cash_settle_df);
        map.insert("CalcTime", self.calc_time);
        map
    }

    /// Named lookup, case-insensitive.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.to_value_map().get(name)
    }

    /// Every measure name a stream valuation can produce.
    #[must_use]
    pub fn measure_names() -> Vec<String> {
        let full = ChannelMeasures {
            upfront: Some(0.0),
            clean_price: Some(0.0),
            dirty_price: Some(0.0),
            ..ChannelMeasures::default()
        };
        let mut channels = [full; 9];
        channels[ConvexityChannel::Unadjusted.slot()].dirty_pv = 1.0;
        let sample = StreamMeasures::new(channels, 0.0, 0.0, Date::MIN, 0.0, 0.0, 0.0, 1.0);
        sample.to_value_map().iter().map(|(name, _)| name.to_string()).collect()
    }
}
