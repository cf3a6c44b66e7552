//! Command dispatcher that routes parsed clap commands to their handlers.
//!
//! Each brokerage note is read and parsed on its own; a note that fails
//! is reported and left out while the others carry on.

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

use crate::cli::formatters;
use crate::cli::Commands;
use opcoes_ir::notes::{self, FormatProfile, NoteScan, TradeRecord};
use opcoes_ir::tax::{self, DayTradeRule, TaxConfig};
use opcoes_ir::utils::format_currency;
use opcoes_ir::{extract, reports};

/// Route a parsed command to its handler
pub fn dispatch_command(command: Commands, json_output: bool) -> Result<()> {
    match command {
        Commands::Parse { files, profile } => dispatch_parse(&files, &profile, json_output),
        Commands::Tax {
            files,
            profile,
            day_trade_rule,
            export,
        } => dispatch_tax(
            &files,
            &profile,
            day_trade_rule,
            export.as_deref(),
            json_output,
        ),
    }
}

/// `auto` leaves the choice to detection, per document
fn requested_profile(arg: &str) -> Result<Option<FormatProfile>> {
    if arg.trim().eq_ignore_ascii_case("auto") {
        return Ok(None);
    }
    Ok(Some(FormatProfile::from_str(arg)?))
}

/// Outcome of one document
#[derive(Debug, Serialize)]
struct NoteOutcome {
    file: String,
    profile: Option<FormatProfile>,
    records: Vec<TradeRecord>,
    skipped_lines: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl NoteOutcome {
    fn empty(file: &str, profile: Option<FormatProfile>) -> Self {
        Self {
            file: file.to_string(),
            profile,
            records: Vec::new(),
            skipped_lines: 0,
            error: None,
        }
    }
}

/// Read and parse one note. I/O failures abort the run; note errors are
/// kept on the outcome and the note contributes no records.
fn load_note(path: &str, requested: Option<FormatProfile>) -> Result<NoteOutcome> {
    let text = extract::read_document(Path::new(path))?;

    let Some((profile, scanned)) = notes::parse_detected(&text, requested) else {
        info!("{}: no known note profile matched", path);
        return Ok(NoteOutcome::empty(path, None));
    };

    match scanned {
        Ok(NoteScan {
            records, skipped, ..
        }) => {
            info!(
                "{}: profile {}, {} record(s), {} skipped line(s)",
                path,
                profile,
                records.len(),
                skipped.len()
            );
            Ok(NoteOutcome {
                records,
                skipped_lines: skipped.len(),
                ..NoteOutcome::empty(path, Some(profile))
            })
        }
        Err(e) => {
            warn!("{}: {}", path, e);
            Ok(NoteOutcome {
                error: Some(e.to_string()),
                ..NoteOutcome::empty(path, Some(profile))
            })
        }
    }
}

fn load_notes(files: &[String], profile_arg: &str) -> Result<Vec<NoteOutcome>> {
    let requested = requested_profile(profile_arg)?;
    files.iter().map(|f| load_note(f, requested)).collect()
}

fn print_note_outcome(outcome: &NoteOutcome) {
    if let Some(error) = &outcome.error {
        eprintln!("{} {}: {}", "✗".red().bold(), outcome.file, error);
        return;
    }
    if outcome.records.is_empty() {
        println!("{}", formatters::format_no_operations(&outcome.file));
        return;
    }

    let profile = outcome.profile.map(|p| p.as_str()).unwrap_or("-");
    println!(
        "\n{} {} (profile {}): {} trade(s)\n",
        "📄".cyan().bold(),
        outcome.file.bold(),
        profile,
        outcome.records.len()
    );
    println!("{}", formatters::format_records_table(&outcome.records));
    if outcome.skipped_lines > 0 {
        println!(
            "  {} {} line(s) skipped (run with RUST_LOG=warn for details)",
            "⚠".yellow().bold(),
            outcome.skipped_lines
        );
    }
}

fn dispatch_parse(files: &[String], profile_arg: &str, json_output: bool) -> Result<()> {
    let outcomes = load_notes(files, profile_arg)?;

    if json_output {
        let payload = serde_json::json!({ "documents": outcomes });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    for outcome in &outcomes {
        print_note_outcome(outcome);
    }
    Ok(())
}

fn dispatch_tax(
    files: &[String],
    profile_arg: &str,
    day_trade_rule: DayTradeRule,
    export: Option<&Path>,
    json_output: bool,
) -> Result<()> {
    let outcomes = load_notes(files, profile_arg)?;

    for outcome in outcomes.iter().filter(|o| o.error.is_some()) {
        print_note_outcome(outcome);
    }

    let records: Vec<TradeRecord> = outcomes
        .iter()
        .flat_map(|o| o.records.iter().cloned())
        .collect();

    let config = TaxConfig {
        day_trade_rule,
        ..TaxConfig::default()
    };
    info!(
        "Computing monthly IR over {} record(s) from {} note(s), day trade rule {}",
        records.len(),
        outcomes.len(),
        day_trade_rule
    );
    let report = tax::compute_with(&records, &config)?;
    let darfs = tax::generate_darf_payments(&report.months);

    if let Some(path) = export {
        let file =
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        reports::write_csv(&report.months, file)?;
        if !json_output {
            println!(
                "{} Report exported to: {}\n",
                "✓".green().bold(),
                path.display()
            );
        }
    }

    if json_output {
        let payload = serde_json::json!({
            "day_trade_rule": day_trade_rule.to_string(),
            "records": records.len(),
            "months": report.months,
            "total_tax": report.total_tax(),
            "closing_carry": report.closing_carry,
            "darfs": darfs,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if report.months.is_empty() {
        println!("\n{} No operations detected\n", "ℹ".blue().bold());
        return Ok(());
    }

    println!("\n{} Monthly IR - Options\n", "📊".cyan().bold());
    println!("{}", formatters::format_monthly_table(&report.months));
    println!(
        "\n  {} {}\n",
        "Total IR:".bold(),
        format_currency(report.total_tax()).yellow().bold()
    );

    if let Some(carry) = formatters::format_closing_carry(&report.closing_carry) {
        println!("{}\n", carry);
    }

    println!("{}\n", tax::format_darf_summary(&darfs));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use opcoes_ir::error::NoteError;

    #[test]
    fn test_requested_profile() {
        assert_eq!(requested_profile("auto").unwrap(), None);
        assert_eq!(requested_profile("AUTO").unwrap(), None);
        assert_eq!(requested_profile("a").unwrap(), Some(FormatProfile::Columnar));
        assert_eq!(requested_profile("b").unwrap(), Some(FormatProfile::Segmented));

        let err = requested_profile("z").unwrap_err();
        assert_eq!(
            err.downcast_ref::<NoteError>(),
            Some(&NoteError::UnknownProfile("z".to_string()))
        );
    }

    #[test]
    fn test_note_error_is_kept_on_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("undated.txt");
        std::fs::write(
            &path,
            "B3 RV LISTADO C OPCAO DE COMPRA 01/24 PETRA400 PN 40,00 PETR 100 10,00 1.000,00 D\n",
        )
        .unwrap();

        let outcome = load_note(path.to_str().unwrap(), None).unwrap();
        assert_eq!(outcome.profile, Some(FormatProfile::Columnar));
        assert!(outcome.records.is_empty());
        assert!(outcome.error.unwrap().contains("no trade date"));
    }

    #[test]
    fn test_unreadable_file_aborts() {
        assert!(load_note("/nonexistent/nota.pdf", None).is_err());
    }
}
