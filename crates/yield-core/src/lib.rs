//! # Yield Core
//!
//! 核心資料模型與類型定義

pub mod allocation;
pub mod config;
pub mod event;
pub mod ledger;
pub mod shortfall;

// Re-export 主要類型
pub use allocation::AllocationEntry;
pub use config::{AttributionMode, EngineConfig, SalePolicy};
pub use event::{IntakeEvent, SaleEvent, StockEvent};
pub use ledger::{Movement, MovementKind, Product, ProductCode, SaleOutcome};
pub use shortfall::{LotAttribution, ShortfallEvent, ShortfallRecord, ShortfallSummary};

/// 產出分配錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum YieldError {
    #[error("找不到產品配置: {0}")]
    UnknownProduct(ProductCode),

    #[error("產品代碼重複: {0}")]
    DuplicateProduct(ProductCode),

    #[error("無效的數量: {0}")]
    InvalidQuantity(String),

    #[error("無效的百分比: {0}")]
    InvalidPercentage(String),
}

pub type Result<T> = std::result::Result<T, YieldError>;
