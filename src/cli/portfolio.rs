use super::ui;
use crate::core::allocation::{AllocationSlice, allocation_by_barbell};
use crate::core::config::AppConfig;
use crate::core::price::QuoteSource;
use crate::core::tables::TableStore;
use crate::core::valuation::{self, FetchOptions, PortfolioValuation, PriceSource, PricingRules};
use anyhow::Result;
use comfy_table::Cell;
use std::time::Duration;
use tracing::info;

fn source_cell(source: PriceSource) -> Cell {
    match source {
        PriceSource::Live => Cell::new("live"),
        PriceSource::Pinned => Cell::new(ui::style_text("pinned", ui::StyleType::Subtle)),
        PriceSource::CostBasis => Cell::new(ui::style_text("cost basis", ui::StyleType::Error)),
    }
}

impl PortfolioValuation {
    pub fn display_as_table(&self, currency: &str) -> String {
        let mut table = ui::new_styled_table();

        table.set_header(vec![
            ui::header_cell("Stock"),
            ui::header_cell("Ticker"),
            ui::header_cell("Units"),
            ui::header_cell(&format!("Buy Price ({currency})")),
            ui::header_cell(&format!("Current Price ({currency})")),
            ui::header_cell("Source"),
            ui::header_cell(&format!("Investment ({currency})")),
            ui::header_cell("Current Value"),
            ui::header_cell(&format!("Gain/Loss ({currency})")),
            ui::header_cell("Gain/Loss (%)"),
            ui::header_cell("Barbell Type"),
        ]);

        for value in &self.holdings {
            let holding = &value.holding;
            table.add_row(vec![
                Cell::new(&holding.stock),
                Cell::new(&holding.ticker),
                ui::amount_cell(holding.units),
                ui::amount_cell(holding.buy_price),
                ui::amount_cell(value.current_price),
                source_cell(value.price_source),
                ui::amount_cell(holding.investment),
                ui::amount_cell(value.current_value),
                ui::gain_cell(value.gain_loss),
                ui::change_cell(value.gain_loss_pct),
                Cell::new(&holding.barbell_type),
            ]);
        }

        let totals = &self.totals;
        let mut output = format!(
            "{}\n\n",
            ui::style_text("Your Shadow AI Portfolio", ui::StyleType::Title)
        );
        output.push_str(&format!(
            "Total Invested ({currency}): {}\n",
            ui::style_text(&ui::format_amount(totals.invested), ui::StyleType::TotalLabel)
        ));
        output.push_str(&format!(
            "Current Value (est, {currency}): {}\n",
            ui::style_text(
                &ui::format_amount(totals.current_value),
                ui::StyleType::TotalValue
            )
        ));
        let total_return = format!(
            "{} ({:+.2}%)",
            ui::format_amount(totals.gain_loss),
            totals.gain_loss_pct
        );
        let return_style = if totals.gain_loss >= 0.0 {
            ui::StyleType::TotalValue
        } else {
            ui::StyleType::Error
        };
        output.push_str(&format!(
            "Total Return: {}\n\n",
            ui::style_text(&total_return, return_style)
        ));

        output.push_str(&table.to_string());

        let fallbacks = self.fallback_count();
        if fallbacks > 0 {
            output.push_str(&format!(
                "\n{}",
                ui::style_text(
                    &format!("{fallbacks} holding(s) valued at cost basis: no live quote"),
                    ui::StyleType::Subtle
                )
            ));
        }

        output
    }
}

/// Renders the allocation by barbell type.
pub fn display_allocation(slices: &[AllocationSlice], currency: &str) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Barbell Type"),
        ui::header_cell("Holdings"),
        ui::header_cell(&format!("Investment ({currency})")),
        ui::header_cell("Weight (%)"),
        ui::header_cell("Current Value"),
        ui::header_cell(&format!("Gain/Loss ({currency})")),
    ]);

    for slice in slices {
        table.add_row(vec![
            Cell::new(&slice.barbell_type),
            Cell::new(slice.holdings),
            ui::amount_cell(slice.invested),
            Cell::new(format!("{:.2}%", slice.weight_pct)),
            ui::amount_cell(slice.current_value),
            ui::gain_cell(slice.gain_loss),
        ]);
    }

    format!(
        "{}\n\n{}",
        ui::style_text("Allocation by Barbell Type", ui::StyleType::Title),
        table
    )
}

/// Values the portfolio and prints the report. With `refresh`, re-values on
/// that interval until interrupted; the table itself is read only once.
pub async fn run(
    config: &AppConfig,
    tables: &TableStore,
    quote_source: &(dyn QuoteSource + Send + Sync),
    refresh: Option<Duration>,
) -> Result<()> {
    let rules = PricingRules::from_config(config);
    let options = FetchOptions::from_config(config);
    let currency = &config.reporting_currency;

    loop {
        let holdings = tables
            .portfolio(&config.portfolio_path(), currency)
            .await?;

        let pb = ui::new_progress_bar(holdings.len() as u64, true);
        pb.set_message("Fetching quotes...");
        let report =
            valuation::valuate(&holdings, quote_source, &rules, &options, &|| pb.inc(1)).await;
        pb.finish_and_clear();

        println!("{}", report.display_as_table(currency));
        ui::print_separator();
        println!(
            "{}",
            display_allocation(&allocation_by_barbell(&report), currency)
        );

        let Some(interval) = refresh else {
            break;
        };
        info!("Next refresh in {}s", interval.as_secs());
        tokio::select! {
            _ = tokio::time::sleep(interval) => ui::print_separator(),
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}
