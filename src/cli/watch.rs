use super::{sectors, summary, ui};
use crate::core::refresh::{DashboardState, RefreshScheduler};
use anyhow::{Context, Result};
use chrono::Local;
use console::Term;
use std::io::BufRead;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyCommand {
    Refresh,
    Quit,
}

fn parse_command(input: &str) -> Option<KeyCommand> {
    match input.trim() {
        "r" | "R" => Some(KeyCommand::Refresh),
        "q" | "Q" => Some(KeyCommand::Quit),
        _ => None,
    }
}

/// Forwards lines from `reader` over a channel from a plain OS thread.
///
/// A blocking read cannot be cancelled, so it is kept off the runtime; the
/// thread is left behind on exit instead of holding up shutdown. The channel
/// closes on EOF or after a read error.
fn spawn_line_reader<R>(reader: R) -> mpsc::Receiver<std::io::Result<String>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(8);
    std::thread::spawn(move || {
        for line in reader.lines() {
            let failed = line.is_err();
            if tx.blocking_send(line).is_err() || failed {
                break;
            }
        }
    });
    rx
}

/// One-line sync indicator shown above the dashboard.
pub fn status_line(state: &DashboardState, interval: Duration) -> String {
    let sync = if state.loading {
        "Syncing...".to_string()
    } else {
        state.last_updated.map_or_else(
            || "Initializing...".to_string(),
            |at| {
                format!(
                    "Last sync: {}",
                    at.with_timezone(&Local).format("%I:%M:%S %p")
                )
            },
        )
    };

    let mut line = format!(
        "{}  {}",
        sync,
        ui::style_text(
            &format!("Live ({}s auto-refresh)", interval.as_secs()),
            ui::StyleType::Subtle
        )
    );
    if let Some(error) = &state.error {
        line.push_str("  ");
        line.push_str(&ui::style_text(error, ui::StyleType::Error));
    }
    line
}

fn render(term: &Term, state: &DashboardState, interval: Duration, currency: &str) -> Result<()> {
    term.clear_screen().context("Failed to clear terminal")?;

    println!(
        "{}\n\n{}\n",
        ui::style_text("Portfolio Dashboard", ui::StyleType::Title),
        status_line(state, interval)
    );

    if state.holdings.is_empty() {
        if state.loading {
            println!("Loading portfolio data...");
        }
    } else {
        println!("{}\n", state.totals.display(currency));
        println!("{}", summary::holdings_table(&state.holdings, currency));
        ui::print_separator();
        println!("{}", sectors::sectors_table(&state.sectors, currency));
    }

    println!(
        "\n{}",
        ui::style_text("Press 'r' + Enter to refresh, 'q' + Enter to quit", ui::StyleType::Subtle)
    );
    Ok(())
}

/// Runs the live dashboard until the user quits or sends Ctrl-C.
pub async fn run(scheduler: Arc<RefreshScheduler>, currency: &str) -> Result<()> {
    let term = Term::stdout();
    let interval = scheduler.interval();
    let mut updates = scheduler.subscribe();

    scheduler.start().await;
    render(&term, &updates.borrow_and_update().clone(), interval, currency)?;

    let mut lines = spawn_line_reader(std::io::BufReader::new(std::io::stdin()));
    let mut stdin_open = true;

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                render(&term, &state, interval, currency)?;
            }
            line = lines.recv(), if stdin_open => {
                match line.transpose().context("Failed to read from stdin")? {
                    Some(input) => match parse_command(&input) {
                        Some(KeyCommand::Refresh) => {
                            let scheduler = Arc::clone(&scheduler);
                            tokio::spawn(async move {
                                let outcome = scheduler.trigger_now().await;
                                debug!(?outcome, "Manual refresh done");
                            });
                        }
                        Some(KeyCommand::Quit) => break,
                        None => {}
                    },
                    None => {
                        debug!("stdin closed, keyboard commands disabled");
                        stdin_open = false;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    scheduler.stop().await;
    Ok(())
}
