//! 缺貨紀錄模型

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ledger::ProductCode;

/// 單次缺貨（餘額不足的銷售嘗試）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortfallEvent {
    /// 產品代碼
    pub product_code: ProductCode,

    /// 銷售時間
    pub timestamp: NaiveDateTime,

    /// 銷售數量
    pub requested: Decimal,

    /// 扣減前餘額
    pub balance_before: Decimal,

    /// 缺口 = 銷售數量 - 扣減前餘額（恆為正）
    pub missing: Decimal,
}

impl ShortfallEvent {
    /// 創建新的缺貨紀錄
    pub fn new(
        product_code: ProductCode,
        timestamp: NaiveDateTime,
        requested: Decimal,
        balance_before: Decimal,
    ) -> Self {
        Self {
            product_code,
            timestamp,
            requested,
            balance_before,
            missing: requested - balance_before,
        }
    }

    /// 缺貨日期
    pub fn day(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

/// 單一產品單日缺貨統計
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortfallRecord {
    /// 產品代碼
    pub product_code: ProductCode,

    /// 日期
    pub day: NaiveDate,

    /// 當日缺貨次數
    pub attempts: u32,

    /// 當日累計缺口
    pub missing: Decimal,
}

/// 缺貨歸因到的進貨批次
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotAttribution {
    /// 批次ID
    pub intake_id: Uuid,

    /// 批次時間
    pub intake_timestamp: NaiveDateTime,

    /// 批次數量
    pub intake_quantity: Decimal,

    /// 用於計算的缺口
    pub missing: Decimal,

    /// 缺口佔批次百分比（無條件進位到小數兩位），批次數量為零時為 None
    pub percent_of_lot: Option<Decimal>,
}

/// 單一產品缺貨彙總
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortfallSummary {
    /// 產品代碼
    pub product_code: ProductCode,

    /// 缺貨總次數
    pub total_attempts: u32,

    /// 缺口總量
    pub total_missing: Decimal,

    /// 每日統計（依日期排序）
    pub daily: Vec<ShortfallRecord>,

    /// 缺貨次數最多的日期
    pub worst_day: NaiveDate,

    /// 該日缺貨次數
    pub worst_day_attempts: u32,

    /// 該日累計缺口
    pub worst_day_missing: Decimal,

    /// 批次歸因（找不到不晚於該日的進貨時為 None）
    pub attribution: Option<LotAttribution>,
}

impl ShortfallSummary {
    /// 缺口佔批次百分比
    pub fn percent_of_lot(&self) -> Option<Decimal> {
        self.attribution.as_ref().and_then(|a| a.percent_of_lot)
    }

    /// 歸因批次數量，無批次時為零
    pub fn attributed_quantity(&self) -> Decimal {
        self.attribution
            .as_ref()
            .map(|a| a.intake_quantity)
            .unwrap_or(Decimal::ZERO)
    }
}
