//! FIFO 批次分配紀錄

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ledger::ProductCode;

/// 銷售對進貨批次的分配（一筆銷售可跨多個批次）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationEntry {
    /// 批次序號（依時間排序後的位置）
    pub lot_index: usize,

    /// 批次ID
    pub lot_id: Uuid,

    /// 銷售ID
    pub sale_id: Uuid,

    /// 銷售時間
    pub sale_timestamp: NaiveDateTime,

    /// 產品代碼
    pub product_code: ProductCode,

    /// 產品描述（分組依據）
    pub description: String,

    /// 分配數量
    pub quantity: Decimal,
}
