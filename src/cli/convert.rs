use super::alerts::render_triggered;
use super::currencies::select_pair;
use super::ui;
use crate::core::alerts::AlertBook;
use crate::core::config::DashboardConfig;
use crate::core::market::MarketDataClient;
use crate::view::{DashboardController, Panel};
use anyhow::Result;
use comfy_table::Cell;
use std::fmt::Write;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct ConvertArgs {
    pub base: Option<String>,
    pub target: Option<String>,
    pub amount: Option<String>,
    /// Keep running and redraw on every refresh until interrupted.
    pub watch: bool,
}

/// Applies command line selections on top of the configured pair.
fn selected_config(config: &DashboardConfig, args: &ConvertArgs) -> Result<DashboardConfig> {
    let pair = select_pair(config.pair(), args.base.as_deref(), args.target.as_deref())?;
    Ok(DashboardConfig {
        base: pair.base,
        target: pair.target,
        ..config.clone()
    })
}

pub async fn run(
    client: Arc<dyn MarketDataClient>,
    config: &DashboardConfig,
    args: ConvertArgs,
    alerts: Option<&AlertBook>,
) -> Result<()> {
    let config = selected_config(config, &args)?;
    let mut dashboard = DashboardController::mount(client, &config);
    if let Some(amount) = &args.amount {
        dashboard.set_amount_input(amount);
    }

    let spinner = ui::new_spinner(&format!("Fetching {}", dashboard.pair()));
    dashboard.settle().await;
    spinner.finish_and_clear();
    print!("{}", render(&dashboard));
    print_alerts(&dashboard, alerts);

    if args.watch {
        watch(&dashboard, alerts).await?;
    }
    dashboard.unmount();
    Ok(())
}

fn print_alerts(dashboard: &DashboardController, alerts: Option<&AlertBook>) {
    if let Some(book) = alerts {
        print!("{}", render_triggered(book, dashboard.rate().data.as_ref()));
    }
}

async fn watch(dashboard: &DashboardController, alerts: Option<&AlertBook>) -> Result<()> {
    println!(
        "{}",
        ui::style_text("Watching for rate updates, press Ctrl-C to stop", ui::StyleType::Subtle)
    );
    let mut revisions = dashboard.subscribe();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                result?;
                debug!("Interrupted");
                break;
            }
            changed = revisions.changed() => {
                if changed.is_err() {
                    break;
                }
                if !dashboard.rate().is_loading {
                    ui::print_separator();
                    print!("{}", render(dashboard));
                    print_alerts(dashboard, alerts);
                }
            }
        }
    }
    Ok(())
}

pub fn render(dashboard: &DashboardController) -> String {
    let mut out = String::new();
    let pair = dashboard.pair();
    let _ = writeln!(
        out,
        "\n{}",
        ui::style_text(
            &format!("Convert {} to {}", pair.base, pair.target),
            ui::StyleType::Title
        )
    );

    let rate = dashboard.rate();
    match dashboard.conversion() {
        Some(conversion) => {
            let mut table = ui::new_styled_table();
            table.set_header(vec![
                ui::header_cell(&format!("Amount ({})", pair.base)),
                ui::header_cell("Rate"),
                ui::header_cell(&format!("Converted ({})", pair.target)),
                ui::header_cell("As of"),
            ]);
            table.add_row(vec![
                ui::number_cell(conversion.amount, 2),
                ui::number_cell(conversion.rate, 4),
                Cell::new(ui::style_text(
                    &format!("{:.2}", conversion.converted),
                    ui::StyleType::Value,
                )),
                Cell::new(conversion.as_of.format("%Y-%m-%d %H:%M:%S UTC")),
            ]);
            let _ = writeln!(out, "{table}");
        }
        None if rate.is_loading => {
            let _ = writeln!(out, "{}", ui::style_text("Loading...", ui::StyleType::Subtle));
        }
        None => {}
    }
    if let Some(error) = &rate.error {
        let _ = writeln!(out, "{}", ui::style_text(&error.message, ui::StyleType::Error));
    }

    let _ = writeln!(out, "\n{}", ui::style_text("Rate History", ui::StyleType::Label));
    let history = dashboard.history_panel();
    if let Some(status) = ui::panel_status(&history, "No historical rates available.") {
        let _ = writeln!(out, "{status}");
    }
    if let Panel::Ready(points) = &history {
        let rates: Vec<f64> = points.iter().map(|p| p.rate).collect();
        let _ = writeln!(out, "{}", ui::sparkline(&rates));
        if let (Some(first), Some(last), Some(range)) =
            (points.first(), points.last(), dashboard.history_range())
        {
            let _ = writeln!(
                out,
                "{} to {}   low {:.4}   high {:.4}   change {:+.2}%",
                first.timestamp.format("%Y-%m-%d"),
                last.timestamp.format("%Y-%m-%d"),
                range.low,
                range.high,
                range.change_percent
            );
        }
    }

    let _ = writeln!(out, "\n{}", ui::style_text("Market News", ui::StyleType::Label));
    let news = dashboard.news_panel();
    if let Some(status) = ui::panel_status(&news, "No news available.") {
        let _ = writeln!(out, "{status}");
    }
    if let Panel::Ready(items) = news {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Headline"),
            ui::header_cell("Source"),
            ui::header_cell("Published"),
        ]);
        for item in items {
            table.add_row(vec![
                Cell::new(&item.title),
                Cell::new(item.source.as_deref().unwrap_or("")),
                ui::optional_cell(item.published_at, |t| t.format("%Y-%m-%d").to_string()),
            ]);
        }
        let _ = writeln!(out, "{table}");
    }
    out
}
