//! Provides functions for performing financial calculations on portfolios.
use crate::core::portfolio::Holding;
use std::collections::HashMap;

/// A holding together with the metrics derived from it on one aggregation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedHolding {
    pub holding: Holding,
    pub investment: f64,
    /// Live price, or the purchase price when none was fetched.
    pub market_price: f64,
    pub present_value: f64,
    pub gain_loss: f64,
    pub gain_loss_percentage: f64,
    pub portfolio_percentage: f64,
}

/// Aggregated figures for all holdings sharing a sector label.
#[derive(Debug, Clone, PartialEq)]
pub struct SectorRollup {
    pub sector: String,
    pub total_investment: f64,
    pub total_present_value: f64,
    pub total_gain_loss: f64,
    pub gain_loss_percentage: f64,
    pub holdings: Vec<EnrichedHolding>,
}

/// Whole-portfolio totals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortfolioTotals {
    pub total_investment: f64,
    pub total_present_value: f64,
    pub total_gain_loss: f64,
    pub gain_loss_percentage: f64,
}

/// `part / whole * 100`, or 0 when `whole` is 0.
fn percentage_of(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        (part / whole) * 100.0
    }
}

/// Calculates investment, present value, gain/loss and portfolio weight for
/// every holding.
///
/// Weights are relative to the total purchase cost of all holdings. Holdings
/// without a live price are valued at their purchase price.
pub fn compute_metrics(holdings: &[Holding]) -> Vec<EnrichedHolding> {
    let total_investment: f64 = holdings
        .iter()
        .map(|h| h.purchase_price * h.quantity)
        .sum();

    holdings
        .iter()
        .map(|holding| {
            let investment = holding.purchase_price * holding.quantity;
            let market_price = holding.effective_price();
            let present_value = market_price * holding.quantity;
            let gain_loss = present_value - investment;

            EnrichedHolding {
                holding: holding.clone(),
                investment,
                market_price,
                present_value,
                gain_loss,
                gain_loss_percentage: percentage_of(gain_loss, investment),
                portfolio_percentage: percentage_of(investment, total_investment),
            }
        })
        .collect()
}

/// Groups holdings by sector, largest total investment first.
///
/// Sectors with equal totals keep the order in which they were first seen.
pub fn group_by_sector(holdings: &[EnrichedHolding]) -> Vec<SectorRollup> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<EnrichedHolding>)> = Vec::new();

    for holding in holdings {
        let sector = holding.holding.sector.as_str();
        match index.get(sector) {
            Some(&i) => groups[i].1.push(holding.clone()),
            None => {
                index.insert(sector, groups.len());
                groups.push((sector, vec![holding.clone()]));
            }
        }
    }

    let mut rollups: Vec<SectorRollup> = groups
        .into_iter()
        .map(|(sector, members)| {
            let total_investment: f64 = members.iter().map(|h| h.investment).sum();
            let total_present_value: f64 = members.iter().map(|h| h.present_value).sum();
            let total_gain_loss = total_present_value - total_investment;
            SectorRollup {
                sector: sector.to_string(),
                total_investment,
                total_present_value,
                total_gain_loss,
                gain_loss_percentage: percentage_of(total_gain_loss, total_investment),
                holdings: members,
            }
        })
        .collect();

    // sort_by is stable
    rollups.sort_by(|a, b| b.total_investment.total_cmp(&a.total_investment));
    rollups
}

pub fn portfolio_totals(holdings: &[EnrichedHolding]) -> PortfolioTotals {
    let total_investment: f64 = holdings.iter().map(|h| h.investment).sum();
    let total_present_value: f64 = holdings.iter().map(|h| h.present_value).sum();
    let total_gain_loss = total_present_value - total_investment;

    PortfolioTotals {
        total_investment,
        total_present_value,
        total_gain_loss,
        gain_loss_percentage: percentage_of(total_gain_loss, total_investment),
    }
}
