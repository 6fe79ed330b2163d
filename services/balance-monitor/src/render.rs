// Ledger rendering for terminal and JSON output

use crate::config::{DisplayConfig, OutputFormat};
use anyhow::Result;
use balance_ledger::{amount::format_units, AccountAddress, Ledger};
use serde_json::json;

pub fn render(account: &AccountAddress, ledger: &Ledger, display: &DisplayConfig) -> Result<String> {
    match display.output {
        OutputFormat::Text => Ok(render_text(account, ledger, display)),
        OutputFormat::Json => render_json(account, ledger),
    }
}

/// One header line, then one row per entry, most recent first
pub fn render_text(account: &AccountAddress, ledger: &Ledger, display: &DisplayConfig) -> String {
    let decimals = display.token_decimals;
    let symbol = &display.token_symbol;

    if ledger.is_empty() {
        let mut out = format!("Balance {account}: no transfer-in requests");
        if ledger.dropped() > 0 {
            out.push_str(&format!(" ({} chain transfers ignored)", ledger.dropped()));
        }
        return out;
    }

    let summary = ledger.summary();
    let mut lines = vec![format!(
        "Balance {account}: {} ({} {symbol}), {} entries",
        summary.balance,
        format_units(&summary.balance, decimals),
        summary.entries
    )];
    if summary.dropped > 0 {
        lines.push(format!(
            "  {} chain transfers before the first transfer-in not shown",
            summary.dropped
        ));
    }

    lines.extend(ledger.entries().iter().map(|entry| {
        format!(
            "  {entry} [{} {symbol} / {} {symbol}]",
            format_units(&entry.delta, decimals),
            format_units(&entry.running_balance, decimals)
        )
    }));

    lines.join("\n")
}

pub fn render_json(account: &AccountAddress, ledger: &Ledger) -> Result<String> {
    let document = json!({
        "account": account,
        "summary": ledger.summary(),
        "entries": ledger.entries(),
    });
    Ok(serde_json::to_string_pretty(&document)?)
}
