use clap::{Parser, Subcommand};
use std::path::PathBuf;

use opcoes_ir::tax::DayTradeRule;

pub mod formatters;

#[derive(Parser)]
#[command(name = "opcoes-ir")]
#[command(
    version,
    about = "Brazilian options brokerage-note parser with monthly IR calculation"
)]
#[command(
    long_about = "Extract options trades from B3 brokerage notes (PDF or text) and compute the monthly income tax on swing and day trade results, with loss carry-forward and DARF due dates."
)]
pub struct Cli {
    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Output results in JSON format
    #[arg(long = "json", global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract options trades from brokerage notes
    Parse {
        /// Brokerage note files (PDF or text)
        #[arg(required = true)]
        files: Vec<String>,

        /// Note layout: auto, a (columnar) or b (segmented)
        #[arg(short, long, default_value = "auto")]
        profile: String,
    },

    /// Compute monthly IR over the trades of all given notes
    Tax {
        /// Brokerage note files (PDF or text)
        #[arg(required = true)]
        files: Vec<String>,

        /// Note layout: auto, a (columnar) or b (segmented)
        #[arg(short, long, default_value = "auto")]
        profile: String,

        /// Day trade pairing: same-date or same-month
        #[arg(long, default_value_t = DayTradeRule::SameDate)]
        day_trade_rule: DayTradeRule,

        /// Export the monthly report to this CSV file
        #[arg(long)]
        export: Option<PathBuf>,
    },
}
