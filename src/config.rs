//! 執行配置（環境變數）

use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;
use yield_core::{AttributionMode, EngineConfig, ProductCode, SalePolicy};

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub percentages_path: PathBuf,
    pub intakes_path: PathBuf,
    pub sales_path: PathBuf,
    pub ideal_output_path: PathBuf,
    pub cuts_output_path: PathBuf,
    pub summary_json_path: Option<PathBuf>,
    pub sale_policy: SalePolicy,
    pub attribution_mode: AttributionMode,
    pub cut_analysis: bool,
    pub movements_for: Option<ProductCode>,
    pub base_code: ProductCode,
    pub base_description: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("環境變數 {0} 的值無效: {1}")]
    InvalidValue(String, String),
}

fn path_or(env_map: &HashMap<String, String>, key: &str, default: &str) -> PathBuf {
    PathBuf::from(env_map.get(key).map(|s| s.as_str()).unwrap_or(default))
}

fn parse_code(key: &str, value: &str) -> Result<ProductCode, ConfigError> {
    value.trim().parse::<ProductCode>().map_err(|_| {
        ConfigError::InvalidValue(key.to_string(), "必須為產品代碼（正整數）".to_string())
    })
}

impl RunConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let sale_policy = match env_map
            .get("YIELD_SALE_POLICY")
            .map(|s| s.as_str())
            .unwrap_or("strict")
        {
            "strict" => SalePolicy::Strict,
            "permissive" => SalePolicy::Permissive,
            other => {
                return Err(ConfigError::InvalidValue(
                    "YIELD_SALE_POLICY".to_string(),
                    format!("必須為 strict 或 permissive，收到 {}", other),
                ))
            }
        };

        let attribution_mode = match env_map
            .get("YIELD_ATTRIBUTION")
            .map(|s| s.as_str())
            .unwrap_or("worst_day")
        {
            "worst_day" => AttributionMode::WorstDay,
            "all_days" => AttributionMode::AllDays,
            other => {
                return Err(ConfigError::InvalidValue(
                    "YIELD_ATTRIBUTION".to_string(),
                    format!("必須為 worst_day 或 all_days，收到 {}", other),
                ))
            }
        };

        let cut_analysis = match env_map
            .get("YIELD_CUT_ANALYSIS")
            .map(|s| s.as_str())
            .unwrap_or("true")
        {
            "true" | "1" => true,
            "false" | "0" => false,
            other => {
                return Err(ConfigError::InvalidValue(
                    "YIELD_CUT_ANALYSIS".to_string(),
                    format!("必須為 true 或 false，收到 {}", other),
                ))
            }
        };

        let movements_for = env_map
            .get("YIELD_MOVEMENTS_FOR")
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_code("YIELD_MOVEMENTS_FOR", s))
            .transpose()?;

        let base_code = match env_map.get("YIELD_BASE_CODE") {
            Some(value) => parse_code("YIELD_BASE_CODE", value)?,
            None => 25274,
        };

        Ok(RunConfig {
            percentages_path: path_or(&env_map, "YIELD_PERCENTAGES", "percentuais.csv"),
            intakes_path: path_or(&env_map, "YIELD_INTAKES", "entradas.csv"),
            sales_path: path_or(&env_map, "YIELD_SALES", "vendas.csv"),
            ideal_output_path: path_or(&env_map, "YIELD_IDEAL_OUTPUT", "percentuais_ideais.csv"),
            cuts_output_path: path_or(&env_map, "YIELD_CUTS_OUTPUT", "analise_cortes.csv"),
            summary_json_path: env_map
                .get("YIELD_SUMMARY_JSON")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            sale_policy,
            attribution_mode,
            cut_analysis,
            movements_for,
            base_code,
            base_description: env_map
                .get("YIELD_BASE_DESCRIPTION")
                .cloned()
                .unwrap_or_else(|| "CARNE BOV RSF KG".to_string()),
        })
    }

    /// 引擎配置
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::new()
            .with_sale_policy(self.sale_policy)
            .with_attribution_mode(self.attribution_mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = RunConfig::from_env_map(HashMap::new()).unwrap();

        assert_eq!(config.percentages_path, PathBuf::from("percentuais.csv"));
        assert_eq!(config.intakes_path, PathBuf::from("entradas.csv"));
        assert_eq!(config.sales_path, PathBuf::from("vendas.csv"));
        assert_eq!(config.ideal_output_path, PathBuf::from("percentuais_ideais.csv"));
        assert_eq!(config.cuts_output_path, PathBuf::from("analise_cortes.csv"));
        assert_eq!(config.summary_json_path, None);
        assert_eq!(config.sale_policy, SalePolicy::Strict);
        assert_eq!(config.attribution_mode, AttributionMode::WorstDay);
        assert!(config.cut_analysis);
        assert_eq!(config.movements_for, None);
        assert_eq!(config.base_code, 25274);
        assert_eq!(config.base_description, "CARNE BOV RSF KG");
    }

    #[test]
    fn test_overrides() {
        let config = RunConfig::from_env_map(env(&[
            ("YIELD_SALES", "/data/vendas_marco.csv"),
            ("YIELD_SALE_POLICY", "permissive"),
            ("YIELD_ATTRIBUTION", "all_days"),
            ("YIELD_CUT_ANALYSIS", "false"),
            ("YIELD_MOVEMENTS_FOR", "145889"),
            ("YIELD_SUMMARY_JSON", "resumo.json"),
        ]))
        .unwrap();

        assert_eq!(config.sales_path, PathBuf::from("/data/vendas_marco.csv"));
        assert_eq!(config.sale_policy, SalePolicy::Permissive);
        assert_eq!(config.attribution_mode, AttributionMode::AllDays);
        assert!(!config.cut_analysis);
        assert_eq!(config.movements_for, Some(145889));
        assert_eq!(config.summary_json_path, Some(PathBuf::from("resumo.json")));

        let engine = config.engine_config();
        assert_eq!(engine.sale_policy, SalePolicy::Permissive);
        assert_eq!(engine.attribution_mode, AttributionMode::AllDays);
    }

    #[test]
    fn test_invalid_sale_policy() {
        let result = RunConfig::from_env_map(env(&[("YIELD_SALE_POLICY", "lenient")]));
        match result {
            Err(ConfigError::InvalidValue(key, _)) => assert_eq!(key, "YIELD_SALE_POLICY"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_invalid_movements_code() {
        let result = RunConfig::from_env_map(env(&[("YIELD_MOVEMENTS_FOR", "abc")]));
        match result {
            Err(ConfigError::InvalidValue(key, _)) => assert_eq!(key, "YIELD_MOVEMENTS_FOR"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_invalid_cut_analysis_flag() {
        assert!(RunConfig::from_env_map(env(&[("YIELD_CUT_ANALYSIS", "maybe")])).is_err());
    }
}
