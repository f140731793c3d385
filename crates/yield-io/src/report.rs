//! 文字報表

use rust_decimal::Decimal;
use std::io::{self, Write};
use yield_calc::{FifoAnalysis, Recalibration, RunResult, RunWarning};
use yield_core::{MovementKind, Product, ProductCode};

use crate::locale::{fixed, DATE_FORMAT};

const RULE_WIDTH: usize = 100;
const DESCRIPTION_WIDTH: usize = 40;

fn rule<W: Write>(out: &mut W, ch: char) -> io::Result<()> {
    writeln!(out, "{}", ch.to_string().repeat(RULE_WIDTH))
}

fn truncate(description: &str) -> String {
    description.chars().take(DESCRIPTION_WIDTH).collect()
}

/// 帳本報表
pub struct StockReport<'a> {
    result: &'a RunResult,
    base_product: Option<(ProductCode, String)>,
}

impl<'a> StockReport<'a> {
    /// 創建新的報表
    pub fn new(result: &'a RunResult) -> Self {
        Self {
            result,
            base_product: None,
        }
    }

    /// 建構器模式：設置原料產品
    pub fn with_base_product(mut self, code: ProductCode, description: impl Into<String>) -> Self {
        self.base_product = Some((code, description.into()));
        self
    }

    /// 逐筆缺貨警示
    pub fn write_shortfall_alerts<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for event in &self.result.shortfalls {
            let description = self
                .result
                .product(event.product_code)
                .map(|p| p.description.as_str())
                .unwrap_or("");
            writeln!(
                out,
                "[缺貨] {} {} {}：需求 {}，可用 {}，缺口 {}",
                event.timestamp.format("%d/%m/%y %H:%M:%S"),
                event.product_code,
                description,
                fixed(event.requested, 3),
                fixed(event.balance_before, 3),
                fixed(event.missing, 3),
            )?;
        }
        Ok(())
    }

    /// 帳本摘要與驗證
    pub fn write_summary<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let result = self.result;

        rule(out, '=')?;
        writeln!(out, "產出分配摘要")?;
        rule(out, '=')?;

        if let Some((code, description)) = &self.base_product {
            writeln!(out, "原料產品: {} - {}", code, description)?;
        }
        writeln!(out, "原料進貨總量: {}", fixed(result.total_base_intake(), 3))?;
        writeln!(out)?;

        writeln!(
            out,
            "{:<10} {:<40} {:>9} {:>14} {:>14} {:>14}",
            "代碼", "描述", "百分比", "進貨", "銷售", "餘額"
        )?;
        rule(out, '-')?;
        for product in &result.products {
            writeln!(
                out,
                "{:<10} {:<40} {:>9}% {:>14} {:>14} {:>14}",
                product.code,
                truncate(&product.description),
                fixed(product.percentage, 2),
                fixed(product.total_intake(), 3),
                fixed(product.total_sale(), 3),
                fixed(product.balance, 3),
            )?;
        }
        rule(out, '-')?;

        let totals = result.totals();
        writeln!(
            out,
            "{:<10} {:<40} {:>9}% {:>14} {:>14} {:>14}",
            "合計",
            "",
            fixed(totals.percentage, 2),
            fixed(totals.intake, 3),
            fixed(totals.sale, 3),
            fixed(totals.balance, 3),
        )?;
        writeln!(out)?;

        if let Some(product) = result.largest_balance() {
            writeln!(
                out,
                "最大餘額: {} - {} ({})",
                product.code,
                truncate(&product.description),
                fixed(product.balance, 3)
            )?;
        }

        self.write_validations(out)
    }

    fn write_validations<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let result = self.result;

        writeln!(out)?;
        writeln!(out, "驗證")?;
        rule(out, '-')?;

        for warning in &result.warnings {
            match warning {
                RunWarning::PercentageTotal { total } => {
                    writeln!(out, "警告: 百分比總和為 {}%，應為 100%", fixed(*total, 2))?
                }
            }
        }

        let negatives = result.negative_products();
        if negatives.is_empty() {
            writeln!(out, "沒有負餘額的產品")?;
        } else {
            writeln!(out, "負餘額產品:")?;
            for product in negatives {
                writeln!(
                    out,
                    "  {} - {}: {}",
                    product.code,
                    product.description,
                    fixed(product.balance, 3)
                )?;
            }
        }

        if result.summaries.is_empty() {
            writeln!(out, "沒有缺貨")?;
            return Ok(());
        }

        writeln!(out)?;
        writeln!(out, "缺貨明細:")?;
        for summary in &result.summaries {
            let description = result
                .product(summary.product_code)
                .map(|p| p.description.as_str())
                .unwrap_or("");
            writeln!(out, "  {} - {}", summary.product_code, description)?;
            writeln!(
                out,
                "    缺貨次數 {}，缺口總量 {}",
                summary.total_attempts,
                fixed(summary.total_missing, 3)
            )?;
            writeln!(
                out,
                "    最嚴重日期 {}：{} 次，缺口 {}",
                summary.worst_day.format(DATE_FORMAT),
                summary.worst_day_attempts,
                fixed(summary.worst_day_missing, 3)
            )?;
            match (&summary.attribution, summary.percent_of_lot()) {
                (Some(lot), Some(percent)) => writeln!(
                    out,
                    "    歸因批次 {}（{}）：缺口佔批次 {}%",
                    lot.intake_timestamp.format("%d/%m/%y %H:%M:%S"),
                    fixed(lot.intake_quantity, 3),
                    fixed(percent, 2)
                )?,
                (Some(lot), None) => writeln!(
                    out,
                    "    歸因批次 {} 數量為零，無法計算百分比",
                    lot.intake_timestamp.format("%d/%m/%y %H:%M:%S")
                )?,
                (None, _) => writeln!(out, "    找不到對應的進貨批次")?,
            }
        }
        Ok(())
    }

    /// 異動明細，`code` 為 None 時列出所有產品
    pub fn write_movements<W: Write>(&self, out: &mut W, code: Option<ProductCode>) -> io::Result<()> {
        let products: Vec<&Product> = match code {
            Some(code) => self.result.product(code).into_iter().collect(),
            None => self.result.products.iter().collect(),
        };

        if products.is_empty() {
            if let Some(code) = code {
                writeln!(out, "找不到產品 {}", code)?;
            }
            return Ok(());
        }

        for product in products {
            writeln!(out)?;
            writeln!(out, "異動明細: {} - {}", product.code, product.description)?;
            rule(out, '-')?;
            writeln!(out, "{:<20} {:<6} {:>14} {:>14}", "時間", "類型", "數量", "餘額")?;
            for movement in &product.movements {
                let kind = match movement.kind {
                    MovementKind::Intake => "進貨",
                    MovementKind::Sale => "銷售",
                };
                writeln!(
                    out,
                    "{:<20} {:<6} {:>14} {:>14}",
                    movement.timestamp.format("%d/%m/%y %H:%M:%S"),
                    kind,
                    fixed(movement.quantity, 3),
                    fixed(movement.balance_after, 3),
                )?;
            }
        }
        Ok(())
    }
}

/// 現行與建議百分比對照表
pub fn write_recalibration<W: Write>(out: &mut W, recalibration: &Recalibration) -> io::Result<()> {
    writeln!(out)?;
    rule(out, '=')?;
    writeln!(out, "建議百分比")?;
    rule(out, '=')?;
    writeln!(
        out,
        "{:<10} {:<40} {:>10} {:>10} {:>10}",
        "代碼", "描述", "現行", "建議", "差異"
    )?;
    rule(out, '-')?;
    for row in &recalibration.rows {
        writeln!(
            out,
            "{:<10} {:<40} {:>9}% {:>9}% {:>10}",
            row.product_code,
            truncate(&row.description),
            fixed(row.current, 2),
            fixed(row.ideal, 2),
            signed(row.difference()),
        )?;
    }
    rule(out, '-')?;
    writeln!(
        out,
        "{:<10} {:<40} {:>9}% {:>9}%",
        "合計",
        "",
        fixed(recalibration.current_total, 2),
        fixed(recalibration.ideal_total, 2),
    )
}

fn signed(value: Decimal) -> String {
    if value > Decimal::ZERO {
        format!("+{}", fixed(value, 2))
    } else {
        fixed(value, 2)
    }
}

/// FIFO 分切分析報表
pub fn write_cut_analysis_report<W: Write>(out: &mut W, analysis: &FifoAnalysis) -> io::Result<()> {
    writeln!(out)?;
    rule(out, '=')?;
    writeln!(out, "FIFO 分切分析")?;
    rule(out, '=')?;

    for lot in &analysis.lots {
        writeln!(
            out,
            "批次 {} ({})：總重 {}，已分配 {} ({}%)",
            lot.lot_index,
            lot.timestamp.format(DATE_FORMAT),
            fixed(lot.lot_quantity, 3),
            fixed(lot.allocated, 3),
            lot.allocated_percent()
                .map(|p| fixed(p, 2))
                .unwrap_or_else(|| "-".to_string()),
        )?;
        for cut in &lot.cuts {
            writeln!(
                out,
                "  {:<40} {:>12} {:>8}%",
                truncate(&cut.description),
                fixed(cut.quantity, 3),
                fixed(cut.percent, 2)
            )?;
        }
    }

    if analysis.unallocated > Decimal::ZERO {
        writeln!(out, "批次用盡後未分配: {}", fixed(analysis.unallocated, 3))?;
    }

    let shares = analysis.max_share_by_product();
    if shares.is_empty() {
        return Ok(());
    }

    writeln!(out)?;
    writeln!(out, "各分切產品單批最大佔比:")?;
    for (description, percent) in &shares {
        writeln!(out, "  {:<40} {:>8}%", truncate(description), fixed(*percent, 2))?;
    }
    let sum: Decimal = shares.iter().map(|(_, p)| *p).sum();
    writeln!(out, "  {:<40} {:>8}%", "合計", fixed(sum, 2))
}
