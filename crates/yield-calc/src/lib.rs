//! # Yield Calculation Engine
//!
//! 進貨分配、缺貨分析與百分比校正

pub mod engine;
pub mod fifo;
pub mod merger;
pub mod recalibration;
pub mod shortfall;

// Re-export 主要類型
pub use engine::AllocationEngine;
pub use fifo::{FifoAnalysis, FifoCutAllocator};
pub use merger::MovementMerger;
pub use recalibration::{Recalibration, Recalibrator};
pub use shortfall::ShortfallAnalyzer;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use yield_core::{
    EngineConfig, IntakeEvent, Product, ProductCode, SaleEvent, ShortfallEvent, ShortfallSummary,
};

/// 載入產品、進貨與銷售並執行分配
pub fn load(
    products: Vec<Product>,
    intakes: Vec<IntakeEvent>,
    sales: Vec<SaleEvent>,
    config: EngineConfig,
) -> yield_core::Result<RunResult> {
    AllocationEngine::new(products, config)?.load(intakes, sales)
}

/// 分配計算結果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// 產品帳本（依代碼排序）
    pub products: Vec<Product>,

    /// 已處理的進貨（依處理順序）
    pub intakes: Vec<IntakeEvent>,

    /// 每一次缺貨
    pub shortfalls: Vec<ShortfallEvent>,

    /// 各產品缺貨彙總（依代碼排序）
    pub summaries: Vec<ShortfallSummary>,

    /// 警告信息
    pub warnings: Vec<RunWarning>,

    /// 是否發生過缺貨
    pub has_alerts: bool,

    /// 使用的引擎配置
    pub config: EngineConfig,

    /// 計算耗時（毫秒）
    pub calculation_time_ms: Option<u128>,
}

impl RunResult {
    /// 是否發生過缺貨
    pub fn has_alerts(&self) -> bool {
        self.has_alerts
    }

    /// 查詢產品帳本
    pub fn product(&self, code: ProductCode) -> Option<&Product> {
        self.products.iter().find(|p| p.code == code)
    }

    /// 查詢產品缺貨彙總
    pub fn summary_for(&self, code: ProductCode) -> Option<&ShortfallSummary> {
        self.summaries.iter().find(|s| s.product_code == code)
    }

    /// 原料進貨總量
    pub fn total_base_intake(&self) -> Decimal {
        self.intakes.iter().map(|i| i.quantity).sum()
    }

    /// 各欄合計
    pub fn totals(&self) -> LedgerTotals {
        self.products
            .iter()
            .fold(LedgerTotals::default(), |mut totals, product| {
                totals.percentage += product.percentage;
                totals.intake += product.total_intake();
                totals.sale += product.total_sale();
                totals.balance += product.balance;
                totals
            })
    }

    /// 餘額為負的產品
    pub fn negative_products(&self) -> Vec<&Product> {
        self.products.iter().filter(|p| p.is_negative()).collect()
    }

    /// 餘額最大的產品（相同時取代碼較小者）
    pub fn largest_balance(&self) -> Option<&Product> {
        self.products
            .iter()
            .reduce(|best, p| if p.balance > best.balance { p } else { best })
    }

    /// 完整的百分比校正結果
    pub fn recalibration(&self) -> Recalibration {
        Recalibrator::new(self.config.adjustment_cap).recalibrate(&self.products, &self.shortfalls)
    }

    /// 建議百分比（依產品代碼）
    pub fn recalibrate(&self) -> BTreeMap<ProductCode, Decimal> {
        self.recalibration().percentages()
    }
}

/// 帳本各欄合計
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerTotals {
    pub percentage: Decimal,
    pub intake: Decimal,
    pub sale: Decimal,
    pub balance: Decimal,
}

/// 執行警告（不中斷計算）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RunWarning {
    /// 產出百分比總和偏離 100
    PercentageTotal { total: Decimal },
}
