//! 進貨與銷售事件模型

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ledger::ProductCode;

/// 原料進貨（一個批次）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntakeEvent {
    /// 批次ID
    pub id: Uuid,

    /// 進貨時間
    pub timestamp: NaiveDateTime,

    /// 原料數量
    pub quantity: Decimal,
}

impl IntakeEvent {
    /// 創建新的進貨
    pub fn new(timestamp: NaiveDateTime, quantity: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            quantity,
        }
    }

    /// 以當日零時創建進貨
    pub fn on_date(date: NaiveDate, quantity: Decimal) -> Self {
        Self::new(date.and_time(chrono::NaiveTime::MIN), quantity)
    }

    /// 進貨日期（去除時間）
    pub fn day(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

/// 產品銷售
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleEvent {
    /// 銷售ID
    pub id: Uuid,

    /// 銷售時間
    pub timestamp: NaiveDateTime,

    /// 產品代碼
    pub product_code: ProductCode,

    /// 銷售數量
    pub quantity: Decimal,

    /// 銷售資料中的產品描述（FIFO 分析使用）
    pub description: Option<String>,
}

impl SaleEvent {
    /// 創建新的銷售
    pub fn new(timestamp: NaiveDateTime, product_code: ProductCode, quantity: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            product_code,
            quantity,
            description: None,
        }
    }

    /// 以當日零時創建銷售
    pub fn on_date(date: NaiveDate, product_code: ProductCode, quantity: Decimal) -> Self {
        Self::new(date.and_time(chrono::NaiveTime::MIN), product_code, quantity)
    }

    /// 建構器模式：設置產品描述
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// 銷售日期（去除時間）
    pub fn day(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// 分組用的產品名稱，無描述時以代碼代替
    pub fn cut_label(&self) -> String {
        match &self.description {
            Some(description) => description.clone(),
            None => self.product_code.to_string(),
        }
    }
}

/// 合併後的庫存事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StockEvent {
    Intake(IntakeEvent),
    Sale(SaleEvent),
}

impl StockEvent {
    /// 事件時間
    pub fn timestamp(&self) -> NaiveDateTime {
        match self {
            StockEvent::Intake(intake) => intake.timestamp,
            StockEvent::Sale(sale) => sale.timestamp,
        }
    }

    /// 檢查是否為進貨
    pub fn is_intake(&self) -> bool {
        matches!(self, StockEvent::Intake(_))
    }
}

impl From<IntakeEvent> for StockEvent {
    fn from(intake: IntakeEvent) -> Self {
        StockEvent::Intake(intake)
    }
}

impl From<SaleEvent> for StockEvent {
    fn from(sale: SaleEvent) -> Self {
        StockEvent::Sale(sale)
    }
}
