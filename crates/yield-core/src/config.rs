//! 分配引擎配置模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 分配引擎參數配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 銷售規則（餘額不足時是否允許扣成負數）
    pub sale_policy: SalePolicy,

    /// 缺貨歸因使用的缺口數量
    pub attribution_mode: AttributionMode,

    /// 百分比為 0 的產品是否仍寫入零數量進貨異動
    pub record_zero_share: bool,

    /// 百分比總和與 100 的容許誤差
    pub percentage_tolerance: Decimal,

    /// 重新校正的最大調整幅度（0.5 = 50%）
    pub adjustment_cap: Decimal,
}

impl EngineConfig {
    /// 創建預設配置
    pub fn new() -> Self {
        Self {
            sale_policy: SalePolicy::Strict,
            attribution_mode: AttributionMode::WorstDay,
            record_zero_share: true,
            percentage_tolerance: Decimal::new(1, 2),
            adjustment_cap: Decimal::new(5, 1),
        }
    }

    /// 建構器模式：設置銷售規則
    pub fn with_sale_policy(mut self, policy: SalePolicy) -> Self {
        self.sale_policy = policy;
        self
    }

    /// 建構器模式：設置缺貨歸因方式
    pub fn with_attribution_mode(mut self, mode: AttributionMode) -> Self {
        self.attribution_mode = mode;
        self
    }

    /// 建構器模式：設置是否記錄零數量異動
    pub fn with_record_zero_share(mut self, record: bool) -> Self {
        self.record_zero_share = record;
        self
    }

    /// 建構器模式：設置百分比容許誤差
    pub fn with_percentage_tolerance(mut self, tolerance: Decimal) -> Self {
        self.percentage_tolerance = tolerance;
        self
    }

    /// 建構器模式：設置最大調整幅度
    pub fn with_adjustment_cap(mut self, cap: Decimal) -> Self {
        self.adjustment_cap = cap;
        self
    }

    /// 檢查百分比總和是否接近 100
    pub fn percentage_total_ok(&self, total: Decimal) -> bool {
        (total - Decimal::ONE_HUNDRED).abs() <= self.percentage_tolerance
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// 銷售規則
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalePolicy {
    /// 嚴格：餘額不足時拒絕銷售，餘額不會為負
    Strict,
    /// 寬鬆：一律扣減，餘額可為負，仍記錄缺貨
    Permissive,
}

/// 缺貨歸因方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributionMode {
    /// 只計算缺貨次數最多那一天的缺口
    WorstDay,
    /// 計算所有缺貨日的缺口總和
    AllDays,
}
