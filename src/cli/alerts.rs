use super::ui;
use crate::core::alerts::{AlertBook, AlertError, RateAlert};
use crate::core::currency::CurrencyPair;
use crate::core::market::{MarketDataClient, RateQuote};
use crate::core::session::SessionContext;
use anyhow::{Result, anyhow};
use comfy_table::Cell;
use std::fmt::Write;
use std::sync::Arc;

fn condition(alert: &RateAlert) -> String {
    format!("{} {:.4}", alert.direction, alert.threshold)
}

/// Subscribes to a rate alert for `pair`, set against the live rate.
///
/// Without `email`, the signed in user's address is used.
pub async fn add(
    client: Arc<dyn MarketDataClient>,
    book: &mut AlertBook,
    session: &SessionContext,
    pair: &CurrencyPair,
    threshold: f64,
    email: Option<&str>,
) -> Result<()> {
    if pair.is_identity() {
        return Err(AlertError::IdentityPair.into());
    }
    let email = match email {
        Some(email) => email.to_string(),
        None => session
            .user()
            .map(|u| u.email)
            .ok_or_else(|| anyhow!("Pass --email or log in to subscribe to alerts"))?,
    };

    let spinner = ui::new_spinner(&format!("Fetching {pair}"));
    let quote = client.fetch_rate(pair).await;
    spinner.finish_and_clear();
    let alert = book.subscribe(&quote?, threshold, &email).await?;

    println!(
        "{} {} when {} is {} (now {:.4})",
        ui::style_text("Alert set:", ui::StyleType::Title),
        alert.email,
        alert.pair,
        ui::style_text(&condition(&alert), ui::StyleType::Value),
        alert.set_at_rate
    );
    Ok(())
}

pub fn list(book: &AlertBook) -> Result<()> {
    if book.alerts().is_empty() {
        println!("No rate alerts. Add one with `fxcast alerts add --threshold <rate>`.");
        return Ok(());
    }
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("#"),
        ui::header_cell("Pair"),
        ui::header_cell("Notify when"),
        ui::header_cell("Set at"),
        ui::header_cell("Email"),
        ui::header_cell("Created"),
    ]);
    for (i, alert) in book.alerts().iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&alert.pair),
            Cell::new(condition(alert)),
            ui::number_cell(alert.set_at_rate, 4),
            Cell::new(&alert.email),
            Cell::new(alert.created_at.format("%Y-%m-%d")),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub async fn remove(book: &mut AlertBook, number: usize) -> Result<()> {
    let removed = book.remove(number).await?;
    println!("Removed alert for {} {}", removed.pair, condition(&removed));
    Ok(())
}

/// Lines for every alert the quote has reached. Empty when none has.
pub fn render_triggered(book: &AlertBook, quote: Option<&RateQuote>) -> String {
    let mut out = String::new();
    let Some(quote) = quote else {
        return out;
    };
    for alert in book.triggered(quote) {
        let _ = writeln!(
            out,
            "{} {} is {} (now {:.4}), notifying {}",
            ui::style_text("Alert:", ui::StyleType::Error),
            alert.pair,
            condition(alert),
            quote.rate,
            alert.email
        );
    }
    out
}
