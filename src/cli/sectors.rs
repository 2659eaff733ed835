use super::{summary, ui};
use crate::core::analytics::{self, SectorRollup};
use crate::core::fetcher::MarketDataFetcher;
use crate::core::portfolio::Holding;
use anyhow::Result;
use comfy_table::{Attribute, Cell, Table};

/// Renders sector rollups, each followed by its member holdings.
pub fn sectors_table(sectors: &[SectorRollup], currency: &str) -> Table {
    let mut table = ui::new_styled_table();

    table.set_header(vec![
        ui::header_cell("Sector / Holding"),
        ui::header_cell("Investment"),
        ui::header_cell("Present Value"),
        ui::header_cell("Gain/Loss"),
        ui::header_cell("Holdings"),
    ]);

    for sector in sectors {
        table.add_row(vec![
            Cell::new(&sector.sector).add_attribute(Attribute::Bold),
            ui::number_cell(ui::format_currency(sector.total_investment, currency)),
            ui::number_cell(ui::format_currency(sector.total_present_value, currency)),
            ui::gain_loss_cell(
                sector.total_gain_loss,
                sector.gain_loss_percentage,
                currency,
            ),
            ui::number_cell(sector.holdings.len().to_string()),
        ]);

        for member in &sector.holdings {
            table.add_row(vec![
                Cell::new(format!("  {}", member.holding.name)),
                ui::number_cell(ui::format_currency(member.investment, currency)),
                ui::number_cell(ui::format_currency(member.present_value, currency)),
                ui::gain_loss_cell(member.gain_loss, member.gain_loss_percentage, currency),
                Cell::new(""),
            ]);
        }
    }

    table
}

pub async fn run(fetcher: &MarketDataFetcher, holdings: &[Holding], currency: &str) -> Result<()> {
    let enriched = summary::fetch_and_compute(fetcher, holdings).await;
    let sectors = analytics::group_by_sector(&enriched);

    println!(
        "{}\n",
        ui::style_text("Sector Allocation", ui::StyleType::Title)
    );
    println!("{}", sectors_table(&sectors, currency));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sectors_table_lists_sectors_and_members() {
        let holdings = vec![
            Holding::new("RELIANCE", 2450.0, 10.0, "Energy")
                .with_name("Reliance Industries")
                .with_current_price(2875.0),
            Holding::new("TCS", 3200.0, 15.0, "Technology").with_name("TCS Ltd"),
        ];
        let sectors = analytics::group_by_sector(&analytics::compute_metrics(&holdings));

        let mut table = sectors_table(&sectors, "₹");
        table.force_no_tty();
        let rendered = table.to_string();

        let technology = rendered.find("Technology").unwrap();
        let energy = rendered.find("Energy").unwrap();
        assert!(technology < energy, "largest sector first");
        assert!(rendered.contains("Reliance Industries"));
        assert!(rendered.contains("₹28,750"));
        assert!(rendered.contains("₹4,250"));
    }
}
