use super::ui;
use crate::core::analytics::{self, EnrichedHolding, PortfolioTotals};
use crate::core::fetcher::MarketDataFetcher;
use crate::core::portfolio::Holding;
use anyhow::Result;
use comfy_table::{Cell, Color, Table};

impl PortfolioTotals {
    pub fn display(&self, currency: &str) -> String {
        let gain_style = ui::gain_loss_style(self.total_gain_loss);
        format!(
            "{}: {}    {}: {}    {}: {} ({})",
            ui::style_text("Total Invested", ui::StyleType::TotalLabel),
            ui::format_currency(self.total_investment, currency),
            ui::style_text("Current Value", ui::StyleType::TotalLabel),
            ui::format_currency(self.total_present_value, currency),
            ui::style_text("Net Gain/Loss", ui::StyleType::TotalLabel),
            ui::style_text(
                &ui::format_currency(self.total_gain_loss, currency),
                gain_style
            ),
            ui::format_percentage(self.gain_loss_percentage),
        )
    }
}

pub fn holdings_table(holdings: &[EnrichedHolding], currency: &str) -> Table {
    let mut table = ui::new_styled_table();

    table.set_header(vec![
        ui::header_cell("Particulars"),
        ui::header_cell("Purchase Price"),
        ui::header_cell("Qty"),
        ui::header_cell("Investment"),
        ui::header_cell("Portfolio (%)"),
        ui::header_cell("Exchange"),
        ui::header_cell("CMP"),
        ui::header_cell("Present Value"),
        ui::header_cell("Gain/Loss"),
        ui::header_cell("P/E Ratio"),
        ui::header_cell("Latest Earnings"),
    ]);

    for enriched in holdings {
        let holding = &enriched.holding;
        let cmp = if holding.current_price.is_known() {
            ui::number_cell(ui::format_currency(enriched.market_price, currency))
        } else {
            ui::number_cell(format!(
                "{} (purchase)",
                ui::format_currency(enriched.market_price, currency)
            ))
            .fg(Color::DarkGrey)
        };
        let pe_ratio =
            ui::format_optional_cell(holding.pe_ratio.as_option(), |pe| format!("{pe:.2}"));
        let earnings = holding
            .latest_earnings
            .as_option()
            .map_or(Cell::new("N/A"), Cell::new);

        table.add_row(vec![
            Cell::new(format!("{}\n{}", holding.name, holding.symbol)),
            ui::number_cell(ui::format_currency(holding.purchase_price, currency)),
            ui::number_cell(format!("{}", holding.quantity)),
            ui::number_cell(ui::format_currency(enriched.investment, currency)),
            ui::number_cell(format!("{:.2}%", enriched.portfolio_percentage)),
            Cell::new(holding.exchange.to_string()),
            cmp,
            ui::number_cell(ui::format_currency(enriched.present_value, currency)),
            ui::gain_loss_cell(enriched.gain_loss, enriched.gain_loss_percentage, currency),
            pe_ratio,
            earnings,
        ]);
    }

    table
}

/// Fetches market data for `holdings` once and prints totals and the holdings table.
pub async fn run(fetcher: &MarketDataFetcher, holdings: &[Holding], currency: &str) -> Result<()> {
    let enriched = fetch_and_compute(fetcher, holdings).await;
    let totals = analytics::portfolio_totals(&enriched);

    println!(
        "{}\n\n{}\n",
        ui::style_text("Portfolio", ui::StyleType::Title),
        totals.display(currency)
    );
    println!("{}", holdings_table(&enriched, currency));

    Ok(())
}

pub(crate) async fn fetch_and_compute(
    fetcher: &MarketDataFetcher,
    holdings: &[Holding],
) -> Vec<EnrichedHolding> {
    let pb = ui::new_progress_bar(holdings.len() as u64, true);
    pb.set_message("Fetching market data...");
    let updated = fetcher
        .fetch_all_with_progress(holdings, &|| pb.inc(1))
        .await;
    pb.finish_and_clear();

    analytics::compute_metrics(&updated)
}
