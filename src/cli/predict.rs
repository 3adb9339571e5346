use super::currencies::select_pair;
use super::ui;
use crate::core::config::PredictionsConfig;
use crate::core::heatmap::EXCHANGE_RATE_COLUMN;
use crate::core::market::{ForecastModel, MarketDataClient};
use crate::view::predictions::RetryHint;
use crate::view::{Panel, PredictionsController};
use anyhow::{Context, Result};
use comfy_table::{Cell, Color};
use std::fmt::Write;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct PredictArgs {
    pub base: Option<String>,
    pub target: Option<String>,
    pub amount: Option<String>,
    pub model: Option<String>,
    pub hide_history: bool,
    /// Include the volatility, correlation and anomaly section.
    pub analysis: bool,
}

fn selected_config(config: &PredictionsConfig, args: &PredictArgs) -> Result<PredictionsConfig> {
    let pair = select_pair(config.pair(), args.base.as_deref(), args.target.as_deref())?;
    let model = match &args.model {
        Some(raw) => raw.parse::<ForecastModel>()?,
        None => config.model.clone(),
    };
    Ok(PredictionsConfig {
        base: pair.base,
        target: pair.target,
        model,
        ..config.clone()
    })
}

pub async fn run(
    client: Arc<dyn MarketDataClient>,
    config: &PredictionsConfig,
    args: PredictArgs,
) -> Result<()> {
    let config = selected_config(config, &args)?;
    let mut screen = PredictionsController::mount(client, &config);
    if let Some(amount) = &args.amount {
        screen.set_amount_input(amount);
    }
    screen.set_show_historical(!args.hide_history);

    if args.analysis {
        // The whole analysis section is on screen
        let mut visible = screen.subscribe_analysis_visibility();
        screen.report_viewport(1.0);
        visible
            .wait_for(|v| *v)
            .await
            .context("Analysis visibility tracking stopped")?;
    }

    let spinner = ui::new_spinner(&format!("Forecasting {}", screen.pair()));
    screen.settle().await;
    spinner.finish_and_clear();

    print!("{}", render_forecast(&screen));
    if screen.analysis_visible() {
        ui::print_separator();
        print!("{}", render_analysis(&screen));
    } else {
        println!(
            "\n{}",
            ui::style_text(
                "Run with --analysis for volatility, correlation and anomaly details.",
                ui::StyleType::Subtle
            )
        );
    }
    screen.unmount();
    Ok(())
}

fn confidence_label(score: Option<f64>) -> String {
    score.map_or_else(|| "N/A".to_string(), |s| format!("{s:.1}%"))
}

pub fn render_forecast(screen: &PredictionsController) -> String {
    let mut out = String::new();
    let pair = screen.pair();
    let _ = writeln!(
        out,
        "\n{}",
        ui::style_text(&format!("{pair} forecast"), ui::StyleType::Title)
    );

    if pair.is_identity() {
        let _ = writeln!(
            out,
            "{} {} = {:.2} {}",
            screen.amount(),
            pair.base,
            screen.amount(),
            pair.target
        );
        return out;
    }

    let state = screen.prediction();
    if state.is_loading {
        let _ = writeln!(out, "{}", ui::style_text("Loading...", ui::StyleType::Subtle));
        return out;
    }
    if let Some(error) = &state.error {
        let hint = RetryHint::for_error(&error.cause);
        let _ = writeln!(out, "{}", ui::style_text("Prediction Error", ui::StyleType::Label));
        let _ = writeln!(out, "{}", ui::style_text(&error.message, ui::StyleType::Error));
        let _ = writeln!(out, "{}", ui::style_text(hint.message(), ui::StyleType::Hint));
        let _ = writeln!(
            out,
            "Retry with: fxcast predict --base {} --target {} --model {}",
            pair.base,
            pair.target,
            hint.suggested_model()
        );
        return out;
    }
    let Some(series) = state.data else {
        return out;
    };

    let _ = writeln!(
        out,
        "{} {:.4}   {} {}   {} {}",
        ui::style_text("Current rate:", ui::StyleType::Label),
        series.current_rate,
        ui::style_text("Confidence:", ui::StyleType::Label),
        confidence_label(series.confidence_score),
        ui::style_text("Model:", ui::StyleType::Label),
        series.model.as_deref().unwrap_or("auto"),
    );
    if let Some(converted) = screen.converted_amount() {
        let _ = writeln!(
            out,
            "{} {} = {} {}",
            screen.amount(),
            pair.base,
            ui::style_text(&format!("{converted:.2}"), ui::StyleType::Value),
            pair.target
        );
    }

    let rows = screen.rate_card();
    if rows.is_empty() {
        let _ = writeln!(out, "No forecast points returned.");
        return out;
    }
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Date"),
        ui::header_cell("High"),
        ui::header_cell("Mean"),
        ui::header_cell("Low"),
        ui::header_cell("Series"),
    ]);
    for row in rows {
        let series_cell = if row.historical {
            Cell::new("Historical").fg(Color::DarkGrey)
        } else {
            Cell::new("Forecast").fg(Color::Cyan)
        };
        table.add_row(vec![
            Cell::new(&row.date),
            ui::number_cell(row.high, 4),
            ui::number_cell(row.mean, 4),
            ui::number_cell(row.low, 4),
            series_cell,
        ]);
    }
    let _ = writeln!(out, "{table}");
    out
}

pub fn render_analysis(screen: &PredictionsController) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "\n{}", ui::style_text("Volatility", ui::StyleType::Label));
    let volatility = screen.volatility_panel();
    if let Some(status) = ui::panel_status(&volatility, "No volatility data.") {
        let _ = writeln!(out, "{status}");
    }
    if let Panel::Ready(v) = volatility {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Level"),
            ui::header_cell("Current"),
            ui::header_cell("Average"),
            ui::header_cell("Trend"),
        ]);
        table.add_row(vec![
            Cell::new(v.level.display_level()),
            ui::number_cell(v.current, 2),
            ui::number_cell(v.average, 2),
            Cell::new(v.trend),
        ]);
        let _ = writeln!(out, "{table}");
    }

    let _ = writeln!(out, "\n{}", ui::style_text("Correlation", ui::StyleType::Label));
    let heatmap = screen.heatmap_panel();
    if let Some(status) = ui::panel_status(&heatmap, "No correlation data available.") {
        let _ = writeln!(out, "{status}");
    }
    if let Panel::Ready(heatmap) = heatmap {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Factor"),
            ui::header_cell(EXCHANGE_RATE_COLUMN),
        ]);
        for cell in &heatmap.cells {
            table.add_row(vec![Cell::new(&cell.row), ui::coefficient_cell(cell.value)]);
        }
        let _ = writeln!(out, "{table}");
    }

    let _ = writeln!(out, "\n{}", ui::style_text("Anomalies", ui::StyleType::Label));
    let anomalies = screen.anomaly_panel();
    if let Some(status) = ui::panel_status(&anomalies, "No anomalies detected in this period.") {
        let _ = writeln!(out, "{status}");
    }
    if let Panel::Ready(report) = anomalies {
        let _ = writeln!(
            out,
            "Detected {} unusual movements over {} days",
            report.count, report.period_days
        );
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Date"),
            ui::header_cell("Rate"),
            ui::header_cell("Z-score"),
            ui::header_cell("Note"),
        ]);
        for point in &report.points {
            let z = ui::number_cell(point.z_score, 2);
            table.add_row(vec![
                Cell::new(point.timestamp.format("%Y-%m-%d")),
                ui::number_cell(point.value, 4),
                if point.is_significant() { z.fg(Color::Magenta) } else { z },
                Cell::new(point.description.as_deref().unwrap_or("")),
            ]);
        }
        let _ = writeln!(out, "{table}");
    }
    out
}
