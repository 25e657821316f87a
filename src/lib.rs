//! calcdeck - Calculator, unit converter and financial calculation engine.
//!
//! Every calculation is a synchronous function of its inputs. Stateful
//! pieces (calculators, converters, the exchange-rate store) are plain
//! values owned by the caller.
//!
//! # Architecture
//!
//! - [`config`] - Configuration loading and management
//! - [`services`] - Calculators, converters and financial tools
//! - [`cli`] - The `calcdeck` command-line front end
//!
//! # Example
//!
//! ```
//! use calcdeck::services::{calculator, scientific, AngleMode};
//!
//! assert_eq!(calculator::evaluate("200+10%").unwrap(), "220");
//! assert_eq!(scientific::evaluate("sin(30)", AngleMode::Degrees).unwrap(), "0.5");
//! ```

// Public modules
pub mod cli;
pub mod config;
pub mod services;

// Internal modules
mod error;

// Re-export commonly used types for convenience
pub use config::Config;
pub use error::{CalcError, CalcResult, ERROR_SENTINEL};
