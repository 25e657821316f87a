//! CLI commands for calcdeck.
//!
//! One subcommand per calculator. Results print as text, or as JSON with
//! `--json`.

pub mod calc;
pub mod convert;
pub mod finance;

use crate::config::Config;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser)]
#[command(name = "calcdeck")]
#[command(about = "Calculator, unit converter and financial calculation engine", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Evaluate an arithmetic expression ("200+10%" is 220)
    Eval {
        /// Expression; separate words are joined with spaces
        #[arg(required = true, allow_hyphen_values = true, trailing_var_arg = true)]
        expression: Vec<String>,
    },

    /// Evaluate a scientific expression (trig in degrees unless --radians)
    Sci {
        #[arg(required = true, allow_hyphen_values = true, trailing_var_arg = true)]
        expression: Vec<String>,

        /// Treat trigonometric arguments as radians
        #[arg(long)]
        radians: bool,

        /// Treat trigonometric arguments as degrees
        #[arg(long, conflicts_with = "radians")]
        degrees: bool,
    },

    /// Convert a length, weight or temperature
    Convert {
        #[arg(value_enum)]
        quantity: Quantity,

        #[arg(allow_negative_numbers = true)]
        value: f64,

        /// Source unit (e.g. km, lb, °F)
        from: String,

        /// Target unit
        to: String,
    },

    /// Convert between currencies
    Currency {
        amount: f64,

        /// Source currency code (e.g. USD)
        from: String,

        /// Target currency code (e.g. EUR)
        to: String,

        /// Rate snapshot in the currency API's JSON shape
        #[arg(long, value_name = "FILE")]
        rates: Option<PathBuf>,
    },

    /// Monthly payment and amortization for a loan
    Loan {
        principal: f64,

        /// Annual interest rate in percent
        rate: f64,

        /// Term in years
        years: f64,

        /// Print every month of the schedule
        #[arg(long)]
        schedule: bool,

        /// Print principal and interest per year
        #[arg(long)]
        yearly: bool,

        /// Display currency (INR, USD or EUR)
        #[arg(long)]
        currency: Option<String>,
    },

    /// Future value of a monthly investment plan
    Sip {
        /// Monthly investment
        amount: f64,

        /// Expected annual return in percent
        rate: f64,

        /// Time period in years
        years: f64,

        /// Print the year-by-year growth
        #[arg(long)]
        yearly: bool,

        /// Display currency (INR, USD or EUR)
        #[arg(long)]
        currency: Option<String>,
    },

    /// Federal income tax for a gross income in US dollars
    Tax {
        income: f64,

        /// single, married or head
        #[arg(long, default_value = "single")]
        status: String,

        /// Display currency (INR, USD or EUR)
        #[arg(long)]
        currency: Option<String>,
    },

    /// Body mass index
    Bmi {
        /// Height in centimeters (inches with --imperial)
        height: f64,

        /// Weight in kilograms (pounds with --imperial)
        weight: f64,

        #[arg(long)]
        imperial: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Quantity {
    Length,
    Weight,
    Temperature,
}

/// Output settings shared by every command
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
}

impl Output {
    /// Print `value` as JSON, or `text` otherwise
    pub fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> anyhow::Result<()> {
        let stdout = io::stdout();
        self.emit_to(&mut stdout.lock(), value, text)
    }

    /// Write the report to `out`. A reader that went away (`| head`) is not an error.
    pub fn emit_to<W: Write, T: Serialize>(
        &self,
        out: &mut W,
        value: &T,
        text: impl FnOnce() -> String,
    ) -> anyhow::Result<()> {
        let rendered = if self.json {
            serde_json::to_string_pretty(value)?
        } else {
            text()
        };
        match writeln!(out, "{}", rendered).and_then(|()| out.flush()) {
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                debug!("Output closed early: {}", e);
                Ok(())
            }
            result => Ok(result?),
        }
    }
}

/// Run a parsed command line
pub fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };
    debug!("Using config: {:?}", config);

    let out = Output { json: cli.json };

    match cli.command {
        Commands::Eval { expression } => calc::run_eval(&expression.join(" "), out),
        Commands::Sci {
            expression,
            radians,
            degrees,
        } => {
            let mode = calc::angle_mode(radians, degrees, config.scientific.angle_mode);
            calc::run_sci(&expression.join(" "), mode, out)
        }
        Commands::Convert {
            quantity,
            value,
            from,
            to,
        } => convert::run_convert(quantity, value, &from, &to, out),
        Commands::Currency {
            amount,
            from,
            to,
            rates,
        } => {
            let rates = rates.or_else(|| config.currency.rates_file.clone());
            convert::run_currency(amount, &from, &to, rates, &config, out)
        }
        Commands::Loan {
            principal,
            rate,
            years,
            schedule,
            yearly,
            currency,
        } => {
            let display = finance::display_currency(currency.as_deref(), &config)?;
            finance::run_loan(principal, rate, years, schedule, yearly, display, out)
        }
        Commands::Sip {
            amount,
            rate,
            years,
            yearly,
            currency,
        } => {
            let display = finance::display_currency(currency.as_deref(), &config)?;
            finance::run_sip(amount, rate, years, yearly, display, out)
        }
        Commands::Tax {
            income,
            status,
            currency,
        } => {
            let display = finance::display_currency(currency.as_deref(), &config)?;
            finance::run_tax(income, &status, &config.tax.table(), display, out)
        }
        Commands::Bmi {
            height,
            weight,
            imperial,
        } => finance::run_bmi(height, weight, imperial, out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_negative_values_and_flags() {
        let cli = Cli::try_parse_from([
            "calcdeck",
            "--json",
            "convert",
            "temperature",
            "-40",
            "f",
            "c",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Convert {
                quantity, value, ..
            } => {
                assert_eq!(quantity, Quantity::Temperature);
                assert_eq!(value, -40.0);
            }
            _ => panic!("expected convert"),
        }
    }

    #[test]
    fn test_expression_words_are_collected() {
        let cli = Cli::try_parse_from(["calcdeck", "eval", "2", "×", "-5"]).unwrap();
        match cli.command {
            Commands::Eval { expression } => assert_eq!(expression.join(" "), "2 × -5"),
            _ => panic!("expected eval"),
        }
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "reader closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "no space left"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_emit_writes_text_or_json() {
        let mut buf = Vec::new();
        Output { json: false }
            .emit_to(&mut buf, &42, || "forty-two".to_string())
            .unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "forty-two\n");

        let mut buf = Vec::new();
        Output { json: true }
            .emit_to(&mut buf, &vec![1, 2], || unreachable!())
            .unwrap();
        let parsed: Vec<i32> = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed, vec![1, 2]);
    }

    #[test]
    fn test_emit_tolerates_closed_pipe() {
        let out = Output { json: false };
        assert!(out.emit_to(&mut ClosedPipe, &0, || "x".repeat(10)).is_ok());
        assert!(out.emit_to(&mut FullDisk, &0, || "x".to_string()).is_err());
    }

    #[test]
    fn test_angle_flags_conflict() {
        assert!(Cli::try_parse_from(["calcdeck", "sci", "--radians", "--degrees", "sin(1)"]).is_err());
    }
}
