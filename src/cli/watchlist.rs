use super::ui;
use crate::core::config::AppConfig;
use crate::core::screening::{self, ScreenedEntry, ScreeningRules};
use crate::core::tables::TableStore;
use anyhow::Result;
use comfy_table::{Cell, CellAlignment};

fn raw_cell(text: &str) -> Cell {
    if text.is_empty() {
        ui::na_cell()
    } else {
        Cell::new(text).set_alignment(CellAlignment::Right)
    }
}

pub fn display_screened(entries: &[ScreenedEntry], search: Option<&str>) -> String {
    let title = match search.map(str::trim).filter(|s| !s.is_empty()) {
        Some(term) => format!("AI Stock Universe: matches for \"{term}\""),
        None => "AI Stock Universe: Watch & Screen".to_string(),
    };
    let mut output = format!("{}\n\n", ui::style_text(&title, ui::StyleType::Title));

    if entries.is_empty() {
        output.push_str(&ui::style_text("No stocks match the search.", ui::StyleType::Subtle));
        return output;
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Stock"),
        ui::header_cell("Ticker"),
        ui::header_cell("P/E"),
        ui::header_cell("YTD %"),
        ui::header_cell("Region"),
        ui::header_cell("Undervalued"),
        ui::header_cell("High Momentum"),
    ]);

    for screened in entries {
        let entry = &screened.entry;
        table.add_row(vec![
            Cell::new(&entry.stock),
            Cell::new(&entry.ticker),
            raw_cell(&entry.pe_ratio),
            raw_cell(&entry.ytd_pct),
            Cell::new(&entry.region),
            ui::flag_cell(screened.undervalued),
            ui::flag_cell(screened.high_momentum),
        ]);
    }
    output.push_str(&table.to_string());

    let regions = screening::count_by_region(entries);
    let mut region_table = ui::new_styled_table();
    region_table.set_header(vec![
        ui::header_cell("Region"),
        ui::header_cell("Stocks"),
        ui::header_cell("Share (%)"),
    ]);
    for (region, count) in &regions {
        let share = *count as f64 / entries.len() as f64 * 100.0;
        region_table.add_row(vec![
            Cell::new(region),
            Cell::new(count),
            Cell::new(format!("{share:.1}%")),
        ]);
    }
    output.push_str(&format!(
        "\n\n{}\n\n{}",
        ui::style_text("Universe by Region", ui::StyleType::Title),
        region_table
    ));

    output
}

pub async fn run(config: &AppConfig, tables: &TableStore, search: Option<&str>) -> Result<()> {
    let watchlist = tables.watchlist(&config.watchlist_path()).await?;
    let rules = ScreeningRules::from(&config.screening);
    let screened = screening::screen(&watchlist, search, &rules);

    println!("{}", display_screened(&screened, search));
    Ok(())
}
