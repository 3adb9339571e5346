use super::ui;
use crate::core::catalog::{ANNUAL_DISCOUNT, PRICING_TIERS, PricingTier, SUBSCRIPTION_PLANS};
use crate::core::session::SessionContext;
use anyhow::Result;
use comfy_table::{Attribute, Cell, Color};

fn price_label(tier: &PricingTier, annual: bool) -> String {
    if tier.monthly_price == 0.0 {
        return "$0".to_string();
    }
    if annual {
        let yearly = tier.monthly_price * 12.0 * (1.0 - ANNUAL_DISCOUNT);
        format!("${yearly:.2}/yr")
    } else {
        format!("${:.2}/mo", tier.monthly_price)
    }
}

/// Prints the pricing tiers. With `predictions`, adds the estimated monthly
/// bill for that usage.
pub fn pricing(predictions: Option<u32>, annual: bool) -> Result<()> {
    println!("\n{}", ui::style_text("Pricing", ui::StyleType::Title));
    if annual {
        println!(
            "{}",
            ui::style_text(
                &format!("Annual billing saves {:.0}%", ANNUAL_DISCOUNT * 100.0),
                ui::StyleType::Hint
            )
        );
    }

    let mut table = ui::new_styled_table();
    let mut header = vec![
        ui::header_cell("Plan"),
        ui::header_cell("Price"),
        ui::header_cell("Included"),
        ui::header_cell("Overage"),
        ui::header_cell("Features"),
    ];
    if let Some(n) = predictions {
        header.push(ui::header_cell(&format!("Cost for {n}")));
    }
    table.set_header(header);

    for tier in PRICING_TIERS {
        let mut name = Cell::new(tier.name).add_attribute(Attribute::Bold);
        if tier.most_popular {
            name = Cell::new(format!("{} (most popular)", tier.name))
                .add_attribute(Attribute::Bold)
                .fg(Color::Magenta);
        }
        let mut row = vec![
            name,
            Cell::new(price_label(tier, annual)),
            Cell::new(format!("{} predictions", tier.included_predictions)),
            ui::optional_cell(tier.overage_per_prediction, |rate| format!("${rate:.3}")),
            Cell::new(tier.features.join("\n")),
        ];
        if let Some(n) = predictions {
            row.push(ui::optional_cell(tier.monthly_cost(n), |cost| {
                format!("${cost:.2}/mo")
            }));
        }
        table.add_row(row);
    }
    println!("{table}");
    Ok(())
}

/// Prints the subscription plans. Requires a signed in user.
pub fn subscriptions(session: &SessionContext) -> Result<()> {
    let user = session.require_user()?;
    println!(
        "\n{} {}",
        ui::style_text("Subscriptions", ui::StyleType::Title),
        ui::style_text(&format!("({})", user.email), ui::StyleType::Subtle)
    );

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Plan"),
        ui::header_cell("Price"),
        ui::header_cell("Features"),
        ui::header_cell("Limitations"),
    ]);
    for plan in SUBSCRIPTION_PLANS {
        let name = if plan.is_current {
            Cell::new(format!("{} (current)", plan.name)).fg(Color::Green)
        } else {
            Cell::new(plan.name)
        };
        table.add_row(vec![
            name,
            Cell::new(plan.price),
            Cell::new(plan.features.join("\n")),
            Cell::new(plan.limitations.join("\n")),
        ]);
    }
    println!("{table}");
    Ok(())
}
