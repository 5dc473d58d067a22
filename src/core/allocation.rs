use crate::core::valuation::{PortfolioValuation, percentage};
use std::collections::BTreeMap;

/// Aggregate of all holdings sharing a barbell type.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationSlice {
    pub barbell_type: String,
    pub holdings: usize,
    pub invested: f64,
    pub current_value: f64,
    pub gain_loss: f64,
    /// Share of total invested, in percent.
    pub weight_pct: f64,
}

/// Buckets valued holdings by barbell type, ordered by type name.
pub fn allocation_by_barbell(valuation: &PortfolioValuation) -> Vec<AllocationSlice> {
    let mut slices: BTreeMap<&str, AllocationSlice> = BTreeMap::new();
    for value in &valuation.holdings {
        let slice = slices
            .entry(value.holding.barbell_type.as_str())
            .or_insert_with(|| AllocationSlice {
                barbell_type: value.holding.barbell_type.clone(),
                holdings: 0,
                invested: 0.0,
                current_value: 0.0,
                gain_loss: 0.0,
                weight_pct: 0.0,
            });
        slice.holdings += 1;
        slice.invested += value.holding.investment;
        slice.current_value += value.current_value;
        slice.gain_loss += value.gain_loss;
    }

    let total_invested = valuation.totals.invested;
    slices
        .into_values()
        .map(|mut slice| {
            slice.weight_pct = percentage(slice.invested, total_invested);
            slice
        })
        .collect()
}
