//! 產品帳本模型

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::SalePolicy;

/// 產品代碼（SEQPRODUTO）
pub type ProductCode = u32;

/// 異動類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementKind {
    /// 進貨分配
    Intake,
    /// 銷售出庫
    Sale,
}

/// 帳本異動（寫入後不可變）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    /// 異動時間
    pub timestamp: NaiveDateTime,

    /// 異動類型
    pub kind: MovementKind,

    /// 異動數量
    pub quantity: Decimal,

    /// 異動後餘額
    pub balance_after: Decimal,
}

/// 銷售套用結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaleOutcome {
    /// 餘額足夠，已扣減
    Fulfilled,
    /// 餘額不足，未扣減（嚴格模式）
    Blocked { balance_before: Decimal },
    /// 餘額不足，仍已扣減（寬鬆模式）
    Overdrawn { balance_before: Decimal },
}

impl SaleOutcome {
    /// 是否發生缺貨
    pub fn is_shortfall(&self) -> bool {
        !matches!(self, SaleOutcome::Fulfilled)
    }

    /// 是否已寫入帳本
    pub fn is_applied(&self) -> bool {
        !matches!(self, SaleOutcome::Blocked { .. })
    }

    /// 缺貨時的扣減前餘額
    pub fn balance_before(&self) -> Option<Decimal> {
        match *self {
            SaleOutcome::Fulfilled => None,
            SaleOutcome::Blocked { balance_before } | SaleOutcome::Overdrawn { balance_before } => {
                Some(balance_before)
            }
        }
    }
}

/// 衍生產品及其帳本
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// 產品代碼
    pub code: ProductCode,

    /// 產品描述
    pub description: String,

    /// 產出百分比（0-100）
    pub percentage: Decimal,

    /// 目前餘額（寬鬆模式下可為負）
    pub balance: Decimal,

    /// 依時間排序的異動紀錄
    pub movements: Vec<Movement>,
}

impl Product {
    /// 創建新的產品（餘額為零）
    pub fn new(code: ProductCode, description: impl Into<String>, percentage: Decimal) -> Self {
        Self {
            code,
            description: description.into(),
            percentage,
            balance: Decimal::ZERO,
            movements: Vec::new(),
        }
    }

    /// 計算一次進貨中分配給本產品的數量
    pub fn derived_share(&self, intake_quantity: Decimal) -> Decimal {
        intake_quantity * self.percentage / Decimal::ONE_HUNDRED
    }

    /// 登記進貨（無條件增加餘額）
    pub fn apply_intake(&mut self, timestamp: NaiveDateTime, quantity: Decimal) {
        self.balance += quantity;
        self.movements.push(Movement {
            timestamp,
            kind: MovementKind::Intake,
            quantity,
            balance_after: self.balance,
        });
    }

    /// 登記銷售
    ///
    /// - `Strict`: 餘額不足時不扣減、不寫異動
    /// - `Permissive`: 一律扣減，餘額可能為負，但仍回報缺貨
    pub fn apply_sale(
        &mut self,
        timestamp: NaiveDateTime,
        quantity: Decimal,
        policy: SalePolicy,
    ) -> SaleOutcome {
        let balance_before = self.balance;
        let sufficient = balance_before >= quantity;

        if !sufficient && policy == SalePolicy::Strict {
            return SaleOutcome::Blocked { balance_before };
        }

        self.balance -= quantity;
        self.movements.push(Movement {
            timestamp,
            kind: MovementKind::Sale,
            quantity,
            balance_after: self.balance,
        });

        if sufficient {
            SaleOutcome::Fulfilled
        } else {
            SaleOutcome::Overdrawn { balance_before }
        }
    }

    /// 進貨總量
    pub fn total_intake(&self) -> Decimal {
        self.total_by_kind(MovementKind::Intake)
    }

    /// 銷售總量
    pub fn total_sale(&self) -> Decimal {
        self.total_by_kind(MovementKind::Sale)
    }

    fn total_by_kind(&self, kind: MovementKind) -> Decimal {
        self.movements
            .iter()
            .filter(|m| m.kind == kind)
            .map(|m| m.quantity)
            .sum()
    }

    /// 檢查餘額是否為負
    pub fn is_negative(&self) -> bool {
        self.balance < Decimal::ZERO
    }
}
