//! Application configuration management.

use serde::{Deserialize, Serialize};

use crate::types::CostComponent;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Chart-of-accounts parent mapping.
    #[serde(default)]
    pub accounts: AccountMapping,
    /// Journal preview settings.
    #[serde(default)]
    pub processing: ProcessingConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Parent accounts under which brand sub-accounts are looked up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMapping {
    /// Inventory asset parents, one per cost component.
    #[serde(default)]
    pub inventory: ComponentAccounts,
    /// Cost-of-goods-sold parents, one per cost component.
    #[serde(default)]
    pub cogs: ComponentAccounts,
    /// Settlement P&L parents, one per fee bucket. Unset buckets are not journaled.
    #[serde(default)]
    pub pnl: PnlAccounts,
}

impl AccountMapping {
    /// Returns true when no parent account has been configured at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inventory.is_empty() && self.cogs.is_empty() && self.pnl.is_empty()
    }
}

/// One parent account ID per cost component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentAccounts {
    /// Manufacturing parent account.
    pub manufacturing: Option<String>,
    /// Freight parent account.
    pub freight: Option<String>,
    /// Duty parent account.
    pub duty: Option<String>,
    /// Accessory parent account.
    pub accessory: Option<String>,
}

impl ComponentAccounts {
    /// Returns the parent account ID configured for a component.
    #[must_use]
    pub fn get(&self, component: CostComponent) -> Option<&str> {
        match component {
            CostComponent::Manufacturing => self.manufacturing.as_deref(),
            CostComponent::Freight => self.freight.as_deref(),
            CostComponent::Duty => self.duty.as_deref(),
            CostComponent::Accessory => self.accessory.as_deref(),
        }
    }

    fn is_empty(&self) -> bool {
        CostComponent::ALL.iter().all(|c| self.get(*c).is_none())
    }
}

/// Parent account IDs for settlement fee buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PnlAccounts {
    /// Amazon sales income.
    pub amazon_sales: Option<String>,
    /// Amazon refunds.
    pub amazon_refunds: Option<String>,
    /// FBA inventory reimbursements.
    pub fba_inventory_reimbursement: Option<String>,
    /// Seller fees (referral/commission).
    pub seller_fees: Option<String>,
    /// AWD warehousing fees.
    pub awd_fees: Option<String>,
    /// FBA fulfilment fees.
    pub fba_fees: Option<String>,
    /// Storage fees.
    pub storage_fees: Option<String>,
    /// Advertising costs.
    pub advertising_costs: Option<String>,
    /// Promotions.
    pub promotions: Option<String>,
}

impl PnlAccounts {
    fn is_empty(&self) -> bool {
        [
            &self.amazon_sales,
            &self.amazon_refunds,
            &self.fba_inventory_reimbursement,
            &self.seller_fees,
            &self.awd_fees,
            &self.fba_fees,
            &self.storage_fees,
            &self.advertising_costs,
            &self.promotions,
        ]
        .iter()
        .all(|id| id.is_none())
    }
}

/// Journal preview settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessingConfig {
    /// Prefix for COGS journal document numbers.
    #[serde(default = "default_cogs_doc_prefix")]
    pub cogs_doc_prefix: String,
    /// Prefix for P&L reclass journal document numbers.
    #[serde(default = "default_pnl_doc_prefix")]
    pub pnl_doc_prefix: String,
}

fn default_cogs_doc_prefix() -> String {
    "COGS".to_string()
}

fn default_pnl_doc_prefix() -> String {
    "PNL".to_string()
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            cogs_doc_prefix: default_cogs_doc_prefix(),
            pnl_doc_prefix: default_pnl_doc_prefix(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON log lines instead of human-readable text.
    #[serde(default)]
    pub json: bool,
}

fn default_log_filter() -> String {
    "cogsbook=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("COGSBOOK").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Loads configuration from a TOML document, still honouring environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be parsed.
    pub fn from_toml_str(toml: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .add_source(config::Environment::with_prefix("COGSBOOK").separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [accounts.inventory]
        manufacturing = "100"
        freight = "101"

        [accounts.cogs]
        manufacturing = "500"

        [accounts.pnl]
        seller_fees = "600"

        [processing]
        cogs_doc_prefix = "C"
    "#;

    #[test]
    fn test_defaults_when_empty() {
        let config = temp_env::with_var_unset("COGSBOOK__LOGGING__FILTER", || {
            AppConfig::from_toml_str("").unwrap()
        });
        assert!(config.accounts.is_empty());
        assert_eq!(config.processing.cogs_doc_prefix, "COGS");
        assert_eq!(config.processing.pnl_doc_prefix, "PNL");
        assert_eq!(config.logging.filter, "cogsbook=info");
        assert!(!config.logging.json);
    }

    #[test]
    fn test_account_mapping_from_toml() {
        let config = AppConfig::from_toml_str(SAMPLE).unwrap();
        let accounts = &config.accounts;
        assert!(!accounts.is_empty());
        assert_eq!(accounts.inventory.get(CostComponent::Manufacturing), Some("100"));
        assert_eq!(accounts.inventory.get(CostComponent::Freight), Some("101"));
        assert_eq!(accounts.inventory.get(CostComponent::Duty), None);
        assert_eq!(accounts.cogs.get(CostComponent::Manufacturing), Some("500"));
        assert_eq!(accounts.pnl.seller_fees.as_deref(), Some("600"));
        assert_eq!(config.processing.cogs_doc_prefix, "C");
        assert_eq!(config.processing.pnl_doc_prefix, "PNL");
    }

    #[test]
    fn test_environment_overrides_file() {
        let config = temp_env::with_var("COGSBOOK__LOGGING__FILTER", Some("debug"), || {
            AppConfig::from_toml_str(SAMPLE).unwrap()
        });
        assert_eq!(config.logging.filter, "debug");
    }

    #[test]
    fn test_pnl_only_mapping_is_not_empty() {
        let mapping = AccountMapping {
            pnl: PnlAccounts {
                promotions: Some("9".into()),
                ..PnlAccounts::default()
            },
            ..AccountMapping::default()
        };
        assert!(!mapping.is_empty());
    }
}
