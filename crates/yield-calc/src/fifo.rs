//! FIFO 分切分析
//!
//! 不經過百分比帳本，直接按時間先後把銷售數量從進貨批次中扣除，
//! 用來量測每個批次實際被各分切產品消耗的比例。

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;
use yield_core::{AllocationEntry, IntakeEvent, SaleEvent};

/// 批次中單一分切產品的佔比
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutShare {
    pub description: String,
    pub quantity: Decimal,
    /// 佔批次重量百分比
    pub percent: Decimal,
}

/// 單一批次的分配明細
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotBreakdown {
    pub lot_index: usize,
    pub lot_id: Uuid,
    pub timestamp: NaiveDateTime,
    pub lot_quantity: Decimal,
    /// 已分配總量
    pub allocated: Decimal,
    /// 依百分比遞減排序
    pub cuts: Vec<CutShare>,
}

impl LotBreakdown {
    /// 已分配佔批次百分比
    pub fn allocated_percent(&self) -> Option<Decimal> {
        percent_of(self.allocated, self.lot_quantity)
    }
}

/// FIFO 分析結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FifoAnalysis {
    pub entries: Vec<AllocationEntry>,
    /// 有分配紀錄的批次（依時間排序）
    pub lots: Vec<LotBreakdown>,
    /// 批次用盡後未能分配的銷售數量
    pub unallocated: Decimal,
}

impl FifoAnalysis {
    /// 每個分切產品在單一批次中的最大佔比（遞減排序）
    pub fn max_share_by_product(&self) -> Vec<(String, Decimal)> {
        let mut max_by_cut: BTreeMap<&str, Decimal> = BTreeMap::new();
        for cut in self.lots.iter().flat_map(|lot| &lot.cuts) {
            max_by_cut
                .entry(cut.description.as_str())
                .and_modify(|max| *max = (*max).max(cut.percent))
                .or_insert(cut.percent);
        }

        let mut shares: Vec<(String, Decimal)> = max_by_cut
            .into_iter()
            .map(|(description, percent)| (description.to_string(), percent))
            .collect();
        shares.sort_by(|a, b| b.1.cmp(&a.1));
        shares
    }

    /// 某一銷售的分配總量
    pub fn allocated_to_sale(&self, sale_id: Uuid) -> Decimal {
        self.entries
            .iter()
            .filter(|e| e.sale_id == sale_id)
            .map(|e| e.quantity)
            .sum()
    }
}

/// FIFO 分切分配器
pub struct FifoCutAllocator;

impl FifoCutAllocator {
    /// 依時間先後將銷售分配到進貨批次
    pub fn allocate(intakes: &[IntakeEvent], sales: &[SaleEvent]) -> FifoAnalysis {
        let mut lots: Vec<&IntakeEvent> = intakes.iter().collect();
        lots.sort_by_key(|lot| lot.timestamp);
        let mut orders: Vec<&SaleEvent> = sales.iter().collect();
        orders.sort_by_key(|sale| sale.timestamp);

        let mut entries = Vec::new();
        let mut unallocated = Decimal::ZERO;
        let mut lot_index = 0;
        let mut remaining = lots.first().map(|lot| lot.quantity).unwrap_or(Decimal::ZERO);

        for sale in orders {
            let mut need = sale.quantity;

            while need > Decimal::ZERO && lot_index < lots.len() {
                let take = need.min(remaining);
                if take > Decimal::ZERO {
                    entries.push(AllocationEntry {
                        lot_index,
                        lot_id: lots[lot_index].id,
                        sale_id: sale.id,
                        sale_timestamp: sale.timestamp,
                        product_code: sale.product_code,
                        description: sale.cut_label(),
                        quantity: take,
                    });
                    need -= take;
                    remaining -= take;
                }

                if remaining <= Decimal::ZERO {
                    lot_index += 1;
                    if let Some(next) = lots.get(lot_index) {
                        remaining = next.quantity;
                    }
                }
            }

            if need > Decimal::ZERO {
                unallocated += need;
            }
        }

        if unallocated > Decimal::ZERO {
            tracing::debug!("批次已用盡，未分配數量 {}", unallocated);
        }

        let lots = Self::breakdown(&lots, &entries);
        FifoAnalysis {
            entries,
            lots,
            unallocated,
        }
    }

    fn breakdown(lots: &[&IntakeEvent], entries: &[AllocationEntry]) -> Vec<LotBreakdown> {
        let mut by_lot: BTreeMap<usize, BTreeMap<&str, Decimal>> = BTreeMap::new();
        for entry in entries {
            *by_lot
                .entry(entry.lot_index)
                .or_default()
                .entry(entry.description.as_str())
                .or_insert(Decimal::ZERO) += entry.quantity;
        }

        by_lot
            .into_iter()
            .map(|(lot_index, cuts)| {
                let lot = lots[lot_index];
                let mut cuts: Vec<CutShare> = cuts
                    .into_iter()
                    .map(|(description, quantity)| CutShare {
                        description: description.to_string(),
                        quantity,
                        percent: percent_of(quantity, lot.quantity).unwrap_or(Decimal::ZERO),
                    })
                    .collect();
                cuts.sort_by(|a, b| b.percent.cmp(&a.percent));

                LotBreakdown {
                    lot_index,
                    lot_id: lot.id,
                    timestamp: lot.timestamp,
                    lot_quantity: lot.quantity,
                    allocated: cuts.iter().map(|c| c.quantity).sum(),
                    cuts,
                }
            })
            .collect()
    }
}

fn percent_of(part: Decimal, whole: Decimal) -> Option<Decimal> {
    if whole <= Decimal::ZERO {
        return None;
    }
    part.checked_mul(Decimal::ONE_HUNDRED)?.checked_div(whole)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 9, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_sale_spans_two_lots() {
        let lots = vec![
            IntakeEvent::new(at(1, 0), Decimal::from(50)),
            IntakeEvent::new(at(3, 0), Decimal::from(50)),
        ];
        let sales = vec![SaleEvent::new(at(4, 0), 1, Decimal::from(90)).with_description("FILE")];

        let analysis = FifoCutAllocator::allocate(&lots, &sales);

        assert_eq!(analysis.entries.len(), 2);
        assert_eq!(analysis.entries[0].quantity, Decimal::from(50));
        assert_eq!(analysis.entries[1].quantity, Decimal::from(40));
        assert_eq!(analysis.lots[0].cuts[0].percent, Decimal::from(100));
        assert_eq!(analysis.lots[1].cuts[0].percent, Decimal::from(80));
        assert_eq!(analysis.unallocated, Decimal::ZERO);
        assert_eq!(analysis.allocated_to_sale(sales[0].id), Decimal::from(90));
    }

    #[test]
    fn test_lot_split_across_sales() {
        let lots = vec![IntakeEvent::new(at(1, 0), Decimal::from(200))];
        let sales = vec![
            SaleEvent::new(at(2, 9), 1, Decimal::from(30)).with_description("ACEM"),
            SaleEvent::new(at(2, 10), 2, Decimal::from(50)).with_description("PATINHO"),
            SaleEvent::new(at(2, 11), 1, Decimal::from(20)).with_description("ACEM"),
        ];

        let analysis = FifoCutAllocator::allocate(&lots, &sales);

        assert_eq!(analysis.lots.len(), 1);
        let lot = &analysis.lots[0];
        assert_eq!(lot.allocated, Decimal::from(100));
        assert_eq!(lot.allocated_percent(), Some(Decimal::from(50)));
        // 同一描述合併，依百分比遞減
        assert_eq!(lot.cuts.len(), 2);
        assert_eq!(lot.cuts[0].description, "ACEM");
        assert_eq!(lot.cuts[0].percent, Decimal::from(25));
        assert_eq!(lot.cuts[1].percent, Decimal::from(25));
    }

    #[test]
    fn test_excess_demand_dropped() {
        let lots = vec![IntakeEvent::new(at(1, 0), Decimal::from(10))];
        let sales = vec![
            SaleEvent::new(at(2, 0), 1, Decimal::from(8)),
            SaleEvent::new(at(3, 0), 1, Decimal::from(8)),
        ];

        let analysis = FifoCutAllocator::allocate(&lots, &sales);

        let total: Decimal = analysis.entries.iter().map(|e| e.quantity).sum();
        assert_eq!(total, Decimal::from(10));
        assert_eq!(analysis.unallocated, Decimal::from(6));
        assert_eq!(analysis.allocated_to_sale(sales[1].id), Decimal::from(2));
    }

    #[test]
    fn test_sorting_by_full_timestamp() {
        let lots = vec![
            IntakeEvent::new(at(1, 18), Decimal::from(10)),
            IntakeEvent::new(at(1, 6), Decimal::from(20)),
        ];
        let sales = vec![SaleEvent::new(at(2, 0), 1, Decimal::from(5))];

        let analysis = FifoCutAllocator::allocate(&lots, &sales);

        assert_eq!(analysis.entries[0].lot_id, lots[1].id);
        assert_eq!(analysis.lots[0].lot_quantity, Decimal::from(20));
    }

    #[test]
    fn test_max_share_by_product() {
        let lots = vec![
            IntakeEvent::new(at(1, 0), Decimal::from(100)),
            IntakeEvent::new(at(2, 0), Decimal::from(100)),
        ];
        let sales = vec![
            SaleEvent::new(at(1, 8), 1, Decimal::from(10)).with_description("ACEM"),
            SaleEvent::new(at(1, 9), 2, Decimal::from(90)).with_description("PATINHO"),
            SaleEvent::new(at(2, 8), 1, Decimal::from(30)).with_description("ACEM"),
        ];

        let analysis = FifoCutAllocator::allocate(&lots, &sales);
        let shares = analysis.max_share_by_product();

        assert_eq!(
            shares,
            vec![
                ("PATINHO".to_string(), Decimal::from(90)),
                ("ACEM".to_string(), Decimal::from(30)),
            ]
        );
    }

    #[test]
    fn test_no_lots() {
        let sales = vec![SaleEvent::new(at(1, 0), 1, Decimal::from(5))];
        let analysis = FifoCutAllocator::allocate(&[], &sales);

        assert!(analysis.entries.is_empty());
        assert!(analysis.lots.is_empty());
        assert_eq!(analysis.unallocated, Decimal::from(5));
    }
}
