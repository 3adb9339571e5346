use super::ui;
use crate::core::currency::{self, CurrencyCode, CurrencyPair};
use anyhow::{Result, anyhow};

/// Resolves user input to a code from the registry.
pub fn registry_code(raw: &str) -> Result<CurrencyCode> {
    currency::find(raw)
        .map(|c| CurrencyCode::from_static(c.code))
        .ok_or_else(|| {
            anyhow!("Unknown currency: {raw}. Run `fxcast currencies` to list supported codes.")
        })
}

/// Applies command line selections on top of a configured pair.
pub fn select_pair(
    mut pair: CurrencyPair,
    base: Option<&str>,
    target: Option<&str>,
) -> Result<CurrencyPair> {
    if let Some(base) = base {
        pair.select_base(registry_code(base)?);
    }
    if let Some(target) = target {
        pair.select_target(registry_code(target)?);
    }
    Ok(pair)
}

pub fn run(query: Option<&str>) -> Result<()> {
    let matches = currency::search(query.unwrap_or_default());
    if matches.is_empty() {
        println!("No currencies found for '{}'.", query.unwrap_or_default());
        return Ok(());
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell(""),
        ui::header_cell("Code"),
        ui::header_cell("Currency"),
    ]);
    for c in &matches {
        table.add_row(vec![c.flag, c.code, c.name]);
    }
    println!("{table}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_code() {
        assert_eq!(registry_code("gbp").unwrap().as_str(), "GBP");
        let err = registry_code("XYZ").unwrap_err();
        assert!(err.to_string().contains("Unknown currency: XYZ"));
    }

    #[test]
    fn test_run_with_no_match() {
        assert!(run(Some("nothing like this")).is_ok());
    }
}
