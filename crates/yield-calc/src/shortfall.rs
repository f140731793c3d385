//! 缺貨分析

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::BTreeMap;
use yield_core::{
    AttributionMode, IntakeEvent, LotAttribution, ProductCode, ShortfallEvent, ShortfallRecord,
    ShortfallSummary,
};

/// 單日統計
#[derive(Debug, Clone, Default)]
struct DayTally {
    attempts: u32,
    missing: Decimal,
}

/// 單一產品的缺貨追蹤
#[derive(Debug, Clone)]
struct ProductTracker {
    daily: BTreeMap<NaiveDate, DayTally>,
    worst_day: NaiveDate,
    worst_day_attempts: u32,
}

impl ProductTracker {
    fn new(first_day: NaiveDate) -> Self {
        Self {
            daily: BTreeMap::new(),
            worst_day: first_day,
            worst_day_attempts: 0,
        }
    }

    fn record(&mut self, day: NaiveDate, missing: Decimal) {
        let tally = self.daily.entry(day).or_default();
        tally.attempts += 1;
        tally.missing += missing;

        // 次數相同時保留先出現的日期
        if tally.attempts > self.worst_day_attempts {
            self.worst_day = day;
            self.worst_day_attempts = tally.attempts;
        }
    }
}

/// 缺貨分析器
///
/// 在引擎重播期間接收每一筆缺貨，依產品、依日期累計次數與缺口，
/// 並在結束時將缺貨最嚴重的日期歸因到最近一次不晚於該日的進貨批次。
#[derive(Debug, Clone, Default)]
pub struct ShortfallAnalyzer {
    events: Vec<ShortfallEvent>,
    trackers: BTreeMap<ProductCode, ProductTracker>,
}

impl ShortfallAnalyzer {
    /// 創建空的分析器
    pub fn new() -> Self {
        Self::default()
    }

    /// 記錄一筆缺貨
    pub fn record(&mut self, event: ShortfallEvent) {
        let day = event.day();
        self.trackers
            .entry(event.product_code)
            .or_insert_with(|| ProductTracker::new(day))
            .record(day, event.missing);
        self.events.push(event);
    }

    /// 是否有任何缺貨
    pub fn has_shortfalls(&self) -> bool {
        !self.events.is_empty()
    }

    /// 所有缺貨（依發生順序）
    pub fn events(&self) -> &[ShortfallEvent] {
        &self.events
    }

    /// 取出所有缺貨
    pub fn into_events(self) -> Vec<ShortfallEvent> {
        self.events
    }

    /// 產生每個產品的缺貨彙總（依產品代碼排序）
    pub fn summarize(
        &self,
        intakes: &[IntakeEvent],
        mode: AttributionMode,
    ) -> Vec<ShortfallSummary> {
        self.trackers
            .iter()
            .map(|(&code, tracker)| Self::summarize_product(code, tracker, intakes, mode))
            .collect()
    }

    fn summarize_product(
        product_code: ProductCode,
        tracker: &ProductTracker,
        intakes: &[IntakeEvent],
        mode: AttributionMode,
    ) -> ShortfallSummary {
        let daily: Vec<ShortfallRecord> = tracker
            .daily
            .iter()
            .map(|(&day, tally)| ShortfallRecord {
                product_code,
                day,
                attempts: tally.attempts,
                missing: tally.missing,
            })
            .collect();

        let total_attempts = daily.iter().map(|r| r.attempts).sum();
        let total_missing: Decimal = daily.iter().map(|r| r.missing).sum();
        let worst_day_missing = tracker
            .daily
            .get(&tracker.worst_day)
            .map(|t| t.missing)
            .unwrap_or(Decimal::ZERO);

        let missing = match mode {
            AttributionMode::WorstDay => worst_day_missing,
            AttributionMode::AllDays => total_missing,
        };

        let attribution = Self::find_lot(intakes, tracker.worst_day).map(|lot| LotAttribution {
            intake_id: lot.id,
            intake_timestamp: lot.timestamp,
            intake_quantity: lot.quantity,
            missing,
            percent_of_lot: Self::percent_of_lot(missing, lot.quantity),
        });

        ShortfallSummary {
            product_code,
            total_attempts,
            total_missing,
            daily,
            worst_day: tracker.worst_day,
            worst_day_attempts: tracker.worst_day_attempts,
            worst_day_missing,
            attribution,
        }
    }

    /// 找出日期不晚於 `day` 的最近一次進貨
    ///
    /// 同一時間有多筆時取輸入順序中的最後一筆。
    pub fn find_lot(intakes: &[IntakeEvent], day: NaiveDate) -> Option<&IntakeEvent> {
        intakes
            .iter()
            .filter(|intake| intake.day() <= day)
            .max_by_key(|intake| intake.timestamp)
    }

    /// 缺口佔批次百分比，無條件進位到小數兩位
    ///
    /// 批次數量不為正時回傳 None。
    pub fn percent_of_lot(missing: Decimal, lot_quantity: Decimal) -> Option<Decimal> {
        if lot_quantity <= Decimal::ZERO {
            return None;
        }

        let percent = missing.checked_mul(Decimal::ONE_HUNDRED)?.checked_div(lot_quantity)?;
        Some(percent.round_dp_with_strategy(2, RoundingStrategy::ToPositiveInfinity))
    }
}
