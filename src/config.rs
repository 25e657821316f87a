use crate::error::{CalcError, CalcResult};
use crate::services::currency::DisplayCurrency;
use crate::services::scientific::AngleMode;
use crate::services::tax::TaxTable;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub calculator: CalculatorConfig,
    pub scientific: ScientificConfig,
    pub converters: ConvertersConfig,
    pub currency: CurrencyConfig,
    pub tax: TaxConfig,
}

/// What a calculator does with its expression when evaluation fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorPolicy {
    /// Keep the expression; stay in the error state until cleared
    PreserveBuffer,
    /// Empty the expression
    ClearBuffer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatorConfig {
    /// None keeps the whole session
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_limit: Option<usize>,
    pub on_error: ErrorPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScientificConfig {
    pub angle_mode: AngleMode,
    pub on_error: ErrorPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertersConfig {
    pub history_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencyConfig {
    /// Currency financial summaries are shown in
    pub display: DisplayCurrency,
    /// Attempts per rate refresh
    pub fetch_attempts: u32,
    /// Optional rate snapshot in the currency API's JSON shape
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rates_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxConfig {
    /// Replaces the built-in bracket table when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<TaxTable>,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            history_limit: None,
            on_error: ErrorPolicy::PreserveBuffer,
        }
    }
}

impl Default for ScientificConfig {
    fn default() -> Self {
        Self {
            angle_mode: AngleMode::Degrees,
            on_error: ErrorPolicy::ClearBuffer,
        }
    }
}

impl Default for ConvertersConfig {
    fn default() -> Self {
        Self { history_limit: 10 }
    }
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            display: DisplayCurrency::Inr,
            fetch_attempts: 3,
            rates_file: None,
        }
    }
}

impl TaxConfig {
    /// The configured table, or the built-in one
    pub fn table(&self) -> TaxTable {
        self.table.clone().unwrap_or_else(TaxTable::us_2023)
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .map(|h| h.join(".config"))
                    .unwrap_or_else(|| PathBuf::from("/tmp"))
            })
            .join("calcdeck")
            .join("config.toml")
    }

    /// Load config from file, or return defaults if not found
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to load config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Load and validate a config file, reporting any failure
    pub fn load_from(path: &Path) -> CalcResult<Self> {
        let content = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Clamp values to acceptable ranges and reject unusable tax tables
    fn validate(&mut self) -> CalcResult<()> {
        // A calculator limit, when set, is between 1 and 10000 entries
        self.calculator.history_limit = self
            .calculator
            .history_limit
            .map(|limit| limit.clamp(1, 10_000));

        // Converters keep between 1 and 100 entries
        self.converters.history_limit = self.converters.history_limit.clamp(1, 100);

        // A refresh needs at least one attempt, and more than 5 is pointless
        self.currency.fetch_attempts = self.currency.fetch_attempts.clamp(1, 5);

        if let Some(table) = &self.tax.table {
            table
                .validate()
                .map_err(|e| CalcError::Config(format!("tax table: {}", e)))?;
        }
        Ok(())
    }

    /// Save config to file
    pub fn save(&self) -> CalcResult<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> CalcResult<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| CalcError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::tax::FilingStatus;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.calculator.history_limit, None);
        assert_eq!(config.calculator.on_error, ErrorPolicy::PreserveBuffer);
        assert_eq!(config.scientific.angle_mode, AngleMode::Degrees);
        assert_eq!(config.scientific.on_error, ErrorPolicy::ClearBuffer);
        assert_eq!(config.converters.history_limit, 10);
        assert_eq!(config.currency.display, DisplayCurrency::Inr);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[scientific]\nangle_mode = \"radians\"\n\n[converters]\nhistory_limit = 500\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.scientific.angle_mode, AngleMode::Radians);
        assert_eq!(config.scientific.on_error, ErrorPolicy::ClearBuffer);
        assert_eq!(config.converters.history_limit, 100);
        assert_eq!(config.currency.fetch_attempts, 3);
    }

    #[test]
    fn test_oversized_history_limit_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[calculator]\nhistory_limit = 9223372036854775807\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.calculator.history_limit, Some(10_000));
        let calc = crate::services::Calculator::new(&config.calculator);
        assert!(calc.history().is_empty());
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[calculator\n").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(CalcError::TomlParse(_))
        ));
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.calculator.history_limit = Some(25);
        config.calculator.on_error = ErrorPolicy::ClearBuffer;
        config.tax.table = Some(TaxTable::us_2023());
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.calculator.history_limit, Some(25));
        assert_eq!(loaded.calculator.on_error, ErrorPolicy::ClearBuffer);
        let table = loaded.tax.table();
        assert_eq!(table.standard_deduction(FilingStatus::Single), 14600.0);
    }

    #[test]
    fn test_unusable_tax_table_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[tax.table.single]
standard_deduction = 1000.0
brackets = []

[tax.table.married_joint]
standard_deduction = 1000.0
brackets = [{ rate = 0.1, min = 0.0 }]

[tax.table.head_of_household]
standard_deduction = 1000.0
brackets = [{ rate = 0.1, min = 0.0 }]
"#,
        )
        .unwrap();
        assert!(matches!(Config::load_from(&path), Err(CalcError::Config(_))));
    }
}
