//! 結果輸出（CSV / JSON）

use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;
use yield_calc::{FifoAnalysis, LedgerTotals, Recalibration, RunResult, RunWarning};
use yield_core::{ProductCode, ShortfallSummary};

use crate::locale::fixed_comma;
use crate::LoadError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

fn writer_for<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new().delimiter(b';').from_writer(writer)
}

/// 寫出建議百分比（percentuais_ideais.csv，格式與輸入檔相同）
pub fn write_recommended_percentages<W: Write>(
    writer: W,
    recalibration: &Recalibration,
) -> Result<(), LoadError> {
    let mut wtr = writer_for(writer);
    wtr.write_record(["SEQPRODUTO", "DESCCOMPLETA", "PERCENTUAL"])?;
    for row in &recalibration.rows {
        wtr.write_record([
            row.product_code.to_string(),
            row.description.clone(),
            fixed_comma(row.ideal, 2),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// 寫出 FIFO 分切分析（analise_cortes.csv）
pub fn write_cut_analysis<W: Write>(mut writer: W, analysis: &FifoAnalysis) -> Result<(), LoadError> {
    writer.write_all(UTF8_BOM)?;
    let mut wtr = writer_for(writer);
    wtr.write_record([
        "ENTRY_IDX",
        "ENTRY_DATE",
        "CUT_DESC",
        "ALLOC_KG",
        "ENTRY_QTY",
        "PERCENT",
    ])?;
    for lot in &analysis.lots {
        for cut in &lot.cuts {
            wtr.write_record([
                lot.lot_index.to_string(),
                lot.timestamp.format("%Y-%m-%d").to_string(),
                cut.description.clone(),
                fixed_comma(cut.quantity, 3),
                fixed_comma(lot.lot_quantity, 3),
                fixed_comma(cut.percent, 2),
            ])?;
        }
    }
    wtr.flush()?;
    Ok(())
}

/// 產品帳本摘要列
#[derive(Debug, Serialize)]
struct ProductRow<'a> {
    code: ProductCode,
    description: &'a str,
    percentage: Decimal,
    total_intake: Decimal,
    total_sale: Decimal,
    balance: Decimal,
}

/// JSON 執行摘要
#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    has_alerts: bool,
    total_base_intake: Decimal,
    products: Vec<ProductRow<'a>>,
    totals: LedgerTotals,
    shortfalls: &'a [ShortfallSummary],
    warnings: &'a [RunWarning],
}

/// 寫出 JSON 執行摘要
pub fn write_summary_json<W: Write>(writer: W, result: &RunResult) -> Result<(), LoadError> {
    let summary = RunSummary {
        has_alerts: result.has_alerts(),
        total_base_intake: result.total_base_intake(),
        products: result
            .products
            .iter()
            .map(|p| ProductRow {
                code: p.code,
                description: &p.description,
                percentage: p.percentage,
                total_intake: p.total_intake(),
                total_sale: p.total_sale(),
                balance: p.balance,
            })
            .collect(),
        totals: result.totals(),
        shortfalls: &result.summaries,
        warnings: &result.warnings,
    };
    serde_json::to_writer_pretty(writer, &summary)?;
    Ok(())
}
