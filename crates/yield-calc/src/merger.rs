//! 進貨與銷售事件合併

use yield_core::{IntakeEvent, SaleEvent, StockEvent};

/// 事件合併器
pub struct MovementMerger;

impl MovementMerger {
    /// 合併進貨與銷售，依時間遞增排序
    ///
    /// 排序為穩定排序：同一時間的事件保持輸入順序（進貨在前、銷售在後的串接順序），
    /// 不依事件類型另行決定先後。
    pub fn merge(intakes: Vec<IntakeEvent>, sales: Vec<SaleEvent>) -> Vec<StockEvent> {
        let mut events: Vec<StockEvent> = Vec::with_capacity(intakes.len() + sales.len());
        events.extend(intakes.into_iter().map(StockEvent::Intake));
        events.extend(sales.into_iter().map(StockEvent::Sale));

        events.sort_by_key(|event| event.timestamp());
        events
    }
}
