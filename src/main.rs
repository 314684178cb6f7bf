use std::str::FromStr;

use anyhow::Context;
use beta_dashboard::{
    config::AppConfig,
    engine::{Dashboard, SaveStatus},
    error::{DashboardError, DashboardResult, ErrorHandler},
    logging::init_logging,
    rest_client::{QuoteProvider, YahooClient},
    risk_manager::{gauge_band, GAUGE_MAX, GAUGE_MIN, GAUGE_REFERENCE},
    store::PortfolioStore,
    Portfolio,
};
use rust_decimal::Decimal;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

const HELP: &str = "commands:
  add <TICKER> <SHARES> [BETA]   add a position (optional beta override in [-5, 5])
  rm <ROW>                       delete a position
  beta <ROW> <VALUE>             edit a position's beta
  cash <AMOUNT>                  set the cash balance
  reset                          remove every position and zero cash
  show                           print the dashboard
  help                           this text
  quit                           exit";

enum Command {
    Add { ticker: String, shares: u64, beta: Option<Decimal> },
    Remove(usize),
    Beta(usize, Decimal),
    Cash(Decimal),
    Reset,
    Show,
    Help,
    Quit,
}

fn parse_decimal(raw: &str, what: &str) -> DashboardResult<Decimal> {
    Decimal::from_str(raw)
        .map_err(|_| DashboardError::InvalidInput(format!("{} '{}' is not a number", what, raw)))
}

fn parse_row(raw: &str) -> DashboardResult<usize> {
    raw.parse()
        .map_err(|_| DashboardError::InvalidInput(format!("row '{}' is not a row number", raw)))
}

fn parse_command(line: &str) -> DashboardResult<Option<Command>> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let cmd = match parts.as_slice() {
        [] => return Ok(None),
        ["add", ticker, shares] | ["add", ticker, shares, _] => {
            let shares = shares.parse::<u64>().map_err(|_| {
                DashboardError::InvalidInput(format!("shares '{}' must be a whole number >= 0", shares))
            })?;
            let beta = match parts.get(3) {
                Some(raw) => Some(parse_decimal(raw, "beta")?),
                None => None,
            };
            Command::Add { ticker: ticker.to_string(), shares, beta }
        }
        ["rm", row] => Command::Remove(parse_row(row)?),
        ["beta", row, value] => Command::Beta(parse_row(row)?, parse_decimal(value, "beta")?),
        ["cash", amount] => Command::Cash(parse_decimal(amount, "cash")?),
        ["reset"] => Command::Reset,
        ["show"] => Command::Show,
        ["help"] => Command::Help,
        ["quit"] | ["exit"] => Command::Quit,
        _ => {
            return Err(DashboardError::InvalidInput(format!(
                "unrecognised command '{}', try 'help'",
                line.trim()
            )))
        }
    };
    Ok(Some(cmd))
}

fn render<P: QuoteProvider>(dash: &Dashboard<P>, portfolio: &Portfolio) {
    if portfolio.is_empty() {
        println!("No positions yet. Add one with: add TQQQ 100");
        println!("Cash: ${:.2}", portfolio.cash_balance);
        return;
    }

    let s = dash.summary(portfolio);
    let band = gauge_band(s.portfolio_beta);
    println!(
        "Portfolio Beta {:.2} | {} | Stock Value ${:.2} | Total Assets ${:.2}",
        s.portfolio_beta, s.risk.label, s.stock_value, s.total_assets
    );
    println!(
        "Gauge [{}, {}]: band {}..{} {} (delta vs {}: {:+.2})",
        GAUGE_MIN,
        GAUGE_MAX,
        band.from,
        band.to,
        band.color,
        GAUGE_REFERENCE,
        s.portfolio_beta - GAUGE_REFERENCE
    );
    println!(
        "{:>3}  {:<6} {:<24} {:>8} {:>10} {:>14} {:>7} {:>6}  {}",
        "row", "ticker", "name", "shares", "price", "value", "weight", "beta", "sector"
    );
    for row in &s.rows {
        println!(
            "{:>3}  {:<6} {:<24} {:>8} {:>10.2} {:>14.2} {:>6.1}% {:>6.2}  {}",
            row.index,
            row.ticker,
            row.name.chars().take(24).collect::<String>(),
            row.shares,
            row.price,
            row.market_value,
            row.weight_pct,
            row.beta,
            row.sector
        );
    }
}

fn report(status: SaveStatus) {
    if let SaveStatus::Unsaved(e) = status {
        println!("warning: {}", ErrorHandler::handle_error(&e));
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => AppConfig::from_file(&path),
        None => AppConfig::from_env(),
    }
    .context("Failed to load configuration")?;
    init_logging(&config.logging);

    let client = YahooClient::new(&config.quote).context("Failed to set up quote client")?;
    let dash = Dashboard::new(client, PortfolioStore::from_config(&config.storage));
    let mut portfolio = dash.load();
    info!("Dashboard ready, portfolio file {}", config.storage.path);

    println!("Portfolio Beta Calculator. Type 'help' for commands.");
    render(&dash, &portfolio);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_command(&line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => continue,
            Err(e) => {
                println!("error: {}", ErrorHandler::handle_error(&e));
                continue;
            }
        };

        let outcome = match command {
            Command::Add { ticker, shares, beta } => {
                dash.add_position(&mut portfolio, &ticker, shares, beta).await
            }
            Command::Remove(row) => dash.remove_position(&mut portfolio, row),
            Command::Beta(row, value) => dash.edit_beta(&mut portfolio, row, value),
            Command::Cash(amount) => dash.set_cash(&mut portfolio, amount),
            Command::Reset => Ok(dash.reset(&mut portfolio)),
            Command::Show => Ok(SaveStatus::Saved),
            Command::Help => {
                println!("{}", HELP);
                continue;
            }
            Command::Quit => break,
        };

        match outcome {
            Ok(status) => {
                report(status);
                render(&dash, &portfolio);
            }
            Err(e) => println!("error: {}", ErrorHandler::handle_error(&e)),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_add_with_and_without_override() {
        match parse_command("add tqqq 100").unwrap() {
            Some(Command::Add { ticker, shares, beta }) => {
                assert_eq!(ticker, "tqqq");
                assert_eq!(shares, 100);
                assert!(beta.is_none());
            }
            _ => panic!("expected add"),
        }
        match parse_command("add SQQQ 5 -2.5").unwrap() {
            Some(Command::Add { beta, .. }) => assert_eq!(beta, Some(Decimal::new(-25, 1))),
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn rejects_negative_shares_and_junk() {
        assert!(matches!(parse_command("add SPY -3"), Err(DashboardError::InvalidInput(_))));
        assert!(matches!(parse_command("cash lots"), Err(DashboardError::InvalidInput(_))));
        assert!(matches!(parse_command("dance"), Err(DashboardError::InvalidInput(_))));
        assert!(parse_command("   ").unwrap().is_none());
    }
}
