use crate::core::analytics::{PortfolioHistory, UNCATEGORIZED};
use crate::core::model::{Asset, AssetValue, CashFlowOperation, Category, Snapshot};
use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use directories::ProjectDirs;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CategoryConfig {
    pub name: String,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub target: Option<Decimal>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AssetConfig {
    pub id: String,
    pub name: Option<String>,
    #[serde(default)]
    pub platform: String,
    pub category: Option<String>,
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CashFlowConfig {
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SnapshotConfig {
    pub id: Option<String>,
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "exact_decimal_map")]
    pub values: BTreeMap<String, Decimal>,
    #[serde(default)]
    pub cash_flows: Vec<CashFlowConfig>,
}

/// YAML numbers are read from their scalar text so no value passes through
/// a float.
#[derive(Deserialize)]
struct ExactDecimal(#[serde(with = "rust_decimal::serde::str")] Decimal);

fn exact_decimal_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = BTreeMap::<String, ExactDecimal>::deserialize(deserializer)?;
    Ok(values
        .into_iter()
        .map(|(asset_id, ExactDecimal(value))| (asset_id, value))
        .collect())
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct PortfolioConfig {
    #[serde(default)]
    pub categories: Vec<CategoryConfig>,
    #[serde(default)]
    pub assets: Vec<AssetConfig>,
    #[serde(default)]
    pub snapshots: Vec<SnapshotConfig>,
}

fn default_retries() -> usize {
    2
}

fn default_retry_delay_ms() -> u64 {
    500
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FrankfurterProviderConfig {
    pub base_url: String,
    #[serde(default = "default_retries")]
    pub retries: usize,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for FrankfurterProviderConfig {
    fn default() -> Self {
        FrankfurterProviderConfig {
            base_url: "https://api.frankfurter.app".to_string(),
            retries: default_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub frankfurter: Option<FrankfurterProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            frankfurter: Some(FrankfurterProviderConfig::default()),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Display currency every report is expressed in.
    pub currency: String,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub goal: Option<Decimal>,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub portfolio: PortfolioConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "snapfolio", "snapfolio")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn rates_provider(&self) -> FrankfurterProviderConfig {
        self.providers.frankfurter.clone().unwrap_or_default()
    }

    /// Builds the read-only history the engine works on.
    ///
    /// Rejects duplicate snapshot dates or ids and values of undeclared
    /// assets.
    pub fn history(&self) -> Result<PortfolioHistory> {
        let portfolio = &self.portfolio;

        let assets: Vec<Asset> = portfolio
            .assets
            .iter()
            .map(|a| Asset {
                id: a.id.clone(),
                name: a.name.clone().unwrap_or_else(|| a.id.clone()),
                platform: a.platform.clone(),
                category: a.category.clone(),
                currency: a.currency.clone().unwrap_or_else(|| self.currency.clone()),
            })
            .collect();
        let asset_ids: HashSet<&str> = assets.iter().map(|a| a.id.as_str()).collect();
        if asset_ids.len() != assets.len() {
            bail!("Asset ids must be unique");
        }

        let mut dates = HashSet::new();
        let mut snapshot_ids = HashSet::new();
        let mut snapshots = Vec::new();
        let mut asset_values = Vec::new();
        let mut cash_flows = Vec::new();

        for entry in &portfolio.snapshots {
            let id = entry.id.clone().unwrap_or_else(|| entry.date.to_string());
            if !dates.insert(entry.date) {
                bail!("Duplicate snapshot date: {}", entry.date);
            }
            if !snapshot_ids.insert(id.clone()) {
                bail!("Duplicate snapshot id: {id}");
            }

            for (asset_id, market_value) in &entry.values {
                if !asset_ids.contains(asset_id.as_str()) {
                    bail!("Snapshot {} references unknown asset: {asset_id}", entry.date);
                }
                asset_values.push(AssetValue {
                    snapshot_id: id.clone(),
                    asset_id: asset_id.clone(),
                    market_value: *market_value,
                });
            }

            cash_flows.extend(entry.cash_flows.iter().map(|flow| CashFlowOperation {
                snapshot_id: id.clone(),
                amount: flow.amount,
                description: flow.description.clone(),
            }));

            snapshots.push(Snapshot {
                id,
                date: entry.date,
            });
        }

        if portfolio.categories.iter().any(|c| c.name == UNCATEGORIZED) {
            bail!("Category name \"{UNCATEGORIZED}\" is reserved for assets without a category");
        }

        let categories = portfolio
            .categories
            .iter()
            .map(|c| Category {
                name: c.name.clone(),
                target_allocation: c.target,
            })
            .collect();

        debug!(
            assets = assets.len(),
            snapshots = snapshots.len(),
            values = asset_values.len(),
            "Built portfolio history"
        );

        Ok(PortfolioHistory {
            assets,
            snapshots,
            asset_values,
            cash_flows,
            categories,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const YAML: &str = r#"
currency: "USD"
goal: 250000
portfolio:
  categories:
    - name: Crypto
      target: 20
    - name: Stocks
      target: 80
    - name: Cash
  assets:
    - id: btc
      name: Bitcoin
      platform: Coinbase
      category: Crypto
    - id: aapl
      platform: Broker
      category: Stocks
    - id: savings
      category: Cash
      currency: EUR
  snapshots:
    - date: 2024-01-31
      values:
        btc: 40000
        savings: 1000.50
    - id: feb
      date: 2024-02-29
      values:
        btc: 50000
        aapl: 15000
      cash_flows:
        - amount: 5000
          description: "Bonus"
        - amount: -250.25
"#;

    #[test]
    fn test_config_deserialization() {
        let config: AppConfig = serde_yaml::from_str(YAML).expect("Failed to deserialize");

        assert_eq!(config.currency, "USD");
        assert_eq!(config.goal, Some(dec!(250000)));
        assert_eq!(config.portfolio.categories.len(), 3);
        assert_eq!(config.portfolio.categories[2].target, None);
        assert_eq!(config.portfolio.assets[2].platform, "");
        assert_eq!(config.portfolio.snapshots[1].cash_flows.len(), 2);
        assert_eq!(
            config.providers.frankfurter.unwrap().base_url,
            "https://api.frankfurter.app"
        );
    }

    #[test]
    fn test_history_conversion() {
        let config: AppConfig = serde_yaml::from_str(YAML).unwrap();
        let history = config.history().unwrap();

        assert_eq!(history.assets.len(), 3);
        let savings = history.asset("savings").unwrap();
        assert_eq!(savings.currency, "EUR");
        assert_eq!(savings.platform, "");
        assert_eq!(savings.name, "savings");
        assert_eq!(history.asset("btc").unwrap().currency, "USD");

        assert_eq!(history.snapshots[0].id, "2024-01-31");
        assert_eq!(history.snapshots[1].id, "feb");
        assert_eq!(history.asset_values.len(), 4);
        assert!(
            history
                .asset_values
                .iter()
                .any(|v| v.asset_id == "savings" && v.market_value == dec!(1000.50))
        );

        assert_eq!(history.net_cash_flow(&history.snapshots[1]), dec!(4749.75));
        assert_eq!(history.categories[0].target_allocation, Some(dec!(20)));
    }

    #[test]
    fn test_provider_overrides() {
        let yaml = r#"
currency: "EUR"
providers:
  frankfurter:
    base_url: "http://localhost:1234"
    retries: 0
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        let provider = config.providers.frankfurter.as_ref().unwrap();
        assert_eq!(provider.base_url, "http://localhost:1234");
        assert_eq!(provider.retries, 0);
        assert_eq!(provider.retry_delay_ms, 500);
        assert_eq!(config.rates_provider().base_url, "http://localhost:1234");
        assert!(config.portfolio.snapshots.is_empty());
    }

    #[test]
    fn test_duplicate_snapshot_dates_are_rejected() {
        let yaml = r#"
currency: "USD"
portfolio:
  snapshots:
    - date: 2024-01-31
    - id: again
      date: 2024-01-31
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        let err = config.history().unwrap_err();
        assert!(err.to_string().contains("Duplicate snapshot date"));
    }

    #[test]
    fn test_unknown_asset_is_rejected() {
        let yaml = r#"
currency: "USD"
portfolio:
  snapshots:
    - date: 2024-01-31
      values:
        ghost: 10
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        let err = config.history().unwrap_err();
        assert!(err.to_string().contains("unknown asset: ghost"));
    }

    #[test]
    fn test_decimals_are_read_exactly() {
        let yaml = r#"
currency: "USD"
goal: 1234567890.123456789
portfolio:
  categories:
    - name: Stocks
      target: 33.333333333333333333
  assets:
    - id: fund
  snapshots:
    - date: 2024-01-31
      values:
        fund: 98765432109.87654321
      cash_flows:
        - amount: 0.30000000000000004441
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.goal, Some(dec!(1234567890.123456789)));
        assert_eq!(
            config.portfolio.categories[0].target,
            Some(dec!(33.333333333333333333))
        );
        let snapshot = &config.portfolio.snapshots[0];
        assert_eq!(snapshot.values["fund"], dec!(98765432109.87654321));
        assert_eq!(snapshot.cash_flows[0].amount, dec!(0.30000000000000004441));
    }

    #[test]
    fn test_reserved_category_name_is_rejected() {
        let yaml = r#"
currency: "USD"
portfolio:
  categories:
    - name: Uncategorized
      target: 10
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        let err = config.history().unwrap_err();
        assert!(err.to_string().contains("is reserved"));
    }
}
