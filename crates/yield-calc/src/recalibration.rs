//! 產出百分比重新校正

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use yield_core::{Product, ProductCode, ShortfallEvent};

/// 單一產品的調整分析
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductAdjustment {
    pub product_code: ProductCode,
    /// 帳本異動筆數
    pub total_movements: usize,
    /// 缺貨次數
    pub problem_events: u32,
    /// 缺口總量
    pub missing_sum: Decimal,
    /// 缺貨頻率 = 缺貨次數 / 異動筆數
    pub frequency: Decimal,
    /// 缺貨嚴重度 = 缺口總量 / 銷售總量
    pub severity: Decimal,
    /// 調整幅度 = min(頻率 + 嚴重度, 上限)
    pub adjustment: Decimal,
}

/// 現行與建議百分比對照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecalibrationRow {
    pub product_code: ProductCode,
    pub description: String,
    /// 現行百分比
    pub current: Decimal,
    /// 建議百分比（小數兩位）
    pub ideal: Decimal,
}

impl RecalibrationRow {
    /// 差異（兩者皆取小數兩位後相減）
    pub fn difference(&self) -> Decimal {
        self.ideal.round_dp(2) - self.current.round_dp(2)
    }
}

/// 重新校正結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recalibration {
    /// 依產品代碼排序
    pub rows: Vec<RecalibrationRow>,
    pub adjustments: Vec<ProductAdjustment>,
    /// 調整前總和
    pub current_total: Decimal,
    /// 調整後總和
    pub ideal_total: Decimal,
}

impl Recalibration {
    /// 建議百分比（依產品代碼）
    pub fn percentages(&self) -> BTreeMap<ProductCode, Decimal> {
        self.rows.iter().map(|r| (r.product_code, r.ideal)).collect()
    }
}

/// 百分比校正器
pub struct Recalibrator {
    cap: Decimal,
}

impl Recalibrator {
    /// 創建新的校正器
    pub fn new(cap: Decimal) -> Self {
        Self { cap }
    }

    /// 分析單一產品需要的調整幅度
    pub fn analyze(&self, product: &Product, shortfalls: &[ShortfallEvent]) -> ProductAdjustment {
        let total_movements = product.movements.len();
        let mut problem_events = 0u32;
        let mut missing_sum = Decimal::ZERO;

        for event in shortfalls.iter().filter(|e| e.product_code == product.code) {
            problem_events += 1;
            missing_sum += event.missing;
        }

        let mut adjustment = ProductAdjustment {
            product_code: product.code,
            total_movements,
            problem_events,
            missing_sum,
            frequency: Decimal::ZERO,
            severity: Decimal::ZERO,
            adjustment: Decimal::ZERO,
        };

        // 沒有異動或沒有缺貨：不調整
        if total_movements == 0 || problem_events == 0 {
            return adjustment;
        }

        let total_sale = product.total_sale();
        let sale_base = if total_sale > Decimal::ZERO {
            total_sale
        } else {
            Decimal::ONE
        };

        adjustment.frequency = Decimal::from(problem_events) / Decimal::from(total_movements);
        adjustment.severity = missing_sum / sale_base;
        adjustment.adjustment = (adjustment.frequency + adjustment.severity).min(self.cap);
        adjustment
    }

    /// 計算建議百分比，正規化後總和維持不變
    pub fn recalibrate(&self, products: &[Product], shortfalls: &[ShortfallEvent]) -> Recalibration {
        let adjustments: Vec<ProductAdjustment> = products
            .iter()
            .map(|p| self.analyze(p, shortfalls))
            .collect();

        let raw: Vec<Decimal> = products
            .iter()
            .zip(&adjustments)
            .map(|(product, adj)| {
                if adj.adjustment > Decimal::ZERO {
                    product.percentage * (Decimal::ONE + adj.adjustment)
                } else {
                    product.percentage
                }
            })
            .collect();

        let current_total: Decimal = products.iter().map(|p| p.percentage).sum();
        let raw_total: Decimal = raw.iter().copied().sum();

        let mut rows: Vec<RecalibrationRow> = products
            .iter()
            .zip(raw)
            .map(|(product, raw_pct)| {
                let normalized = if raw_total.is_zero() {
                    raw_pct
                } else {
                    raw_pct * current_total / raw_total
                };
                RecalibrationRow {
                    product_code: product.code,
                    description: product.description.clone(),
                    current: product.percentage,
                    ideal: normalized.round_dp(2),
                }
            })
            .collect();
        rows.sort_by_key(|r| r.product_code);

        let ideal_total = rows.iter().map(|r| r.ideal).sum();

        tracing::debug!(
            "重新校正完成：現行總和 {}，建議總和 {}",
            current_total,
            ideal_total
        );

        Recalibration {
            rows,
            adjustments,
            current_total,
            ideal_total,
        }
    }
}

impl Default for Recalibrator {
    fn default() -> Self {
        Self::new(Decimal::new(5, 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use yield_core::SalePolicy;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 8, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_no_shortfall_keeps_percentages() {
        let mut a = Product::new(1, "A", Decimal::from(60));
        let mut b = Product::new(2, "B", Decimal::from(40));
        a.apply_intake(at(1), Decimal::from(60));
        b.apply_intake(at(1), Decimal::from(40));

        let result = Recalibrator::default().recalibrate(&[a, b], &[]);

        assert_eq!(result.percentages()[&1], Decimal::from(60));
        assert_eq!(result.percentages()[&2], Decimal::from(40));
        assert_eq!(result.ideal_total, Decimal::from(100));
    }

    #[test]
    fn test_adjustment_formula() {
        // 2 次進貨 + 1 次超賣：異動 3 筆
        let mut a = Product::new(1, "A", Decimal::from(50));
        a.apply_intake(at(1), Decimal::from(10));
        a.apply_intake(at(2), Decimal::from(10));
        let outcome = a.apply_sale(at(3), Decimal::from(25), SalePolicy::Permissive);
        let shortfall = ShortfallEvent::new(
            1,
            at(3),
            Decimal::from(25),
            outcome.balance_before().unwrap(),
        );

        let adj = Recalibrator::default().analyze(&a, &[shortfall]);

        assert_eq!(adj.total_movements, 3);
        assert_eq!(adj.problem_events, 1);
        assert_eq!(adj.missing_sum, Decimal::from(5));
        // 頻率 1/3，嚴重度 5/25 = 0.2
        assert_eq!(adj.severity, Decimal::new(2, 1));
        // 0.533... 超過上限 50%
        assert_eq!(adj.adjustment, Decimal::new(5, 1));
    }

    #[test]
    fn test_adjustment_below_cap() {
        let mut a = Product::new(1, "A", Decimal::from(50));
        for day in 1..=9 {
            a.apply_intake(at(day), Decimal::from(10));
        }
        a.apply_sale(at(10), Decimal::from(100), SalePolicy::Permissive);
        let shortfall = ShortfallEvent::new(1, at(10), Decimal::from(100), Decimal::from(90));

        let adj = Recalibrator::default().analyze(&a, &[shortfall]);

        // 頻率 1/10 = 0.1，嚴重度 10/100 = 0.1
        assert_eq!(adj.frequency, Decimal::new(1, 1));
        assert_eq!(adj.severity, Decimal::new(1, 1));
        assert_eq!(adj.adjustment, Decimal::new(2, 1));
    }

    #[test]
    fn test_zero_history_no_penalty() {
        let a = Product::new(1, "A", Decimal::from(50));
        let shortfall = ShortfallEvent::new(1, at(1), Decimal::from(5), Decimal::ZERO);

        let adj = Recalibrator::default().analyze(&a, &[shortfall]);
        assert_eq!(adj.adjustment, Decimal::ZERO);
    }

    #[test]
    fn test_normalization_preserves_total() {
        let mut a = Product::new(1, "A", Decimal::from(60));
        let mut b = Product::new(2, "B", Decimal::from(40));
        for day in 1..=9 {
            a.apply_intake(at(day), Decimal::from(6));
            b.apply_intake(at(day), Decimal::from(4));
        }
        a.apply_sale(at(10), Decimal::from(60), SalePolicy::Permissive);
        let shortfall = ShortfallEvent::new(1, at(10), Decimal::from(60), Decimal::from(54));

        let result = Recalibrator::default().recalibrate(&[a, b], &[shortfall]);

        // A: 頻率 0.1 + 嚴重度 0.1 → 72；B 40；總和 112 → 縮放 100/112
        let pct = result.percentages();
        assert_eq!(pct[&1], Decimal::new(6429, 2));
        assert_eq!(pct[&2], Decimal::new(3571, 2));
        assert_eq!(result.current_total, Decimal::from(100));
        assert_eq!(result.ideal_total, Decimal::from(100));
        assert_eq!(result.rows[0].difference(), Decimal::new(429, 2));
    }

    #[test]
    fn test_total_preserved_when_not_hundred() {
        let mut a = Product::new(1, "A", Decimal::from(30));
        let b = Product::new(2, "B", Decimal::from(50));
        a.apply_intake(at(1), Decimal::from(3));
        a.apply_sale(at(2), Decimal::from(6), SalePolicy::Strict);
        let shortfall = ShortfallEvent::new(1, at(2), Decimal::from(6), Decimal::from(3));

        let result = Recalibrator::default().recalibrate(&[a, b], &[shortfall]);

        let diff = (result.ideal_total - Decimal::from(80)).abs();
        assert!(diff <= Decimal::new(2, 2));
    }

    #[test]
    fn test_all_zero_percentages() {
        let a = Product::new(1, "A", Decimal::ZERO);
        let result = Recalibrator::default().recalibrate(&[a], &[]);
        assert_eq!(result.percentages()[&1], Decimal::ZERO);
    }
}
