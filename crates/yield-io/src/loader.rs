//! CSV 資料載入
//!
//! 三個輸入檔皆以 `;` 分隔、第一行為欄位名稱：
//!   percentuais.csv: SEQPRODUTO;DESCCOMPLETA;PERCENTUAL
//!   entradas.csv:    DATA;[HORA;]QUANTIDADE
//!   vendas.csv:      DATA;[HORA;]SEQPRODUTO;[DESCCOMPLETA;]QUANTIDADE

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use yield_core::{IntakeEvent, Product, ProductCode, SaleEvent};

use crate::locale::{self, deserialize_date, deserialize_decimal};
use crate::LoadError;

/// 產出百分比設定
#[derive(Debug, Clone, Deserialize)]
pub struct PercentageRecord {
    #[serde(rename = "SEQPRODUTO")]
    pub code: ProductCode,
    #[serde(rename = "DESCCOMPLETA")]
    pub description: String,
    #[serde(rename = "PERCENTUAL", deserialize_with = "deserialize_decimal")]
    pub percentage: Decimal,
}

/// 進貨紀錄
#[derive(Debug, Clone, Deserialize)]
pub struct IntakeRecord {
    #[serde(rename = "DATA", deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    #[serde(rename = "HORA", default)]
    pub time: Option<String>,
    #[serde(rename = "QUANTIDADE", deserialize_with = "deserialize_decimal")]
    pub quantity: Decimal,
}

/// 銷售紀錄
#[derive(Debug, Clone, Deserialize)]
pub struct SaleRecord {
    #[serde(rename = "DATA", deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    #[serde(rename = "HORA", default)]
    pub time: Option<String>,
    #[serde(rename = "SEQPRODUTO")]
    pub code: ProductCode,
    #[serde(rename = "DESCCOMPLETA", default)]
    pub description: Option<String>,
    #[serde(rename = "QUANTIDADE", deserialize_with = "deserialize_decimal")]
    pub quantity: Decimal,
}

fn reader_for<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn read_records<R, T>(reader: R) -> Result<Vec<T>, LoadError>
where
    R: Read,
    T: for<'de> Deserialize<'de>,
{
    let mut csv_reader = reader_for(reader);
    let mut records = Vec::new();
    for (line_num, result) in csv_reader.deserialize().enumerate() {
        let record: T = result.map_err(|source| LoadError::Csv {
            line: line_num + 2,
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}

fn open(path: &Path) -> Result<std::fs::File, LoadError> {
    std::fs::File::open(path).map_err(|source| LoadError::Open {
        path: path.display().to_string(),
        source,
    })
}

/// 載入產品與產出百分比
pub fn load_products<R: Read>(reader: R) -> Result<Vec<Product>, LoadError> {
    let records: Vec<PercentageRecord> = read_records(reader)?;
    Ok(records
        .into_iter()
        .map(|r| Product::new(r.code, r.description, r.percentage))
        .collect())
}

/// 從檔案載入產品
pub fn load_products_file(path: impl AsRef<Path>) -> Result<Vec<Product>, LoadError> {
    load_products(open(path.as_ref())?)
}

/// 載入進貨
pub fn load_intakes<R: Read>(reader: R) -> Result<Vec<IntakeEvent>, LoadError> {
    let records: Vec<IntakeRecord> = read_records(reader)?;
    records
        .into_iter()
        .enumerate()
        .map(|(i, r)| {
            let timestamp = locale::combine(r.date, r.time.as_deref()).map_err(|message| {
                LoadError::Field {
                    line: i + 2,
                    field: "HORA",
                    message,
                }
            })?;
            Ok(IntakeEvent::new(timestamp, r.quantity))
        })
        .collect()
}

/// 從檔案載入進貨
pub fn load_intakes_file(path: impl AsRef<Path>) -> Result<Vec<IntakeEvent>, LoadError> {
    load_intakes(open(path.as_ref())?)
}

/// 載入銷售（不過濾產品代碼）
pub fn load_sales<R: Read>(reader: R) -> Result<Vec<SaleEvent>, LoadError> {
    let records: Vec<SaleRecord> = read_records(reader)?;
    records
        .into_iter()
        .enumerate()
        .map(|(i, r)| {
            let timestamp = locale::combine(r.date, r.time.as_deref()).map_err(|message| {
                LoadError::Field {
                    line: i + 2,
                    field: "HORA",
                    message,
                }
            })?;
            let sale = SaleEvent::new(timestamp, r.code, r.quantity);
            Ok(match r.description.filter(|d| !d.is_empty()) {
                Some(description) => sale.with_description(description),
                None => sale,
            })
        })
        .collect()
}

/// 從檔案載入銷售
pub fn load_sales_file(path: impl AsRef<Path>) -> Result<Vec<SaleEvent>, LoadError> {
    load_sales(open(path.as_ref())?)
}

/// 只保留已設定產品的銷售，回傳保留的銷售與丟棄筆數
///
/// 沒有描述的銷售會補上產品設定中的描述。
pub fn retain_known(sales: Vec<SaleEvent>, products: &[Product]) -> (Vec<SaleEvent>, usize) {
    let catalog: HashMap<ProductCode, &str> = products
        .iter()
        .map(|p| (p.code, p.description.as_str()))
        .collect();

    let total = sales.len();
    let kept: Vec<SaleEvent> = sales
        .into_iter()
        .filter_map(|sale| {
            let description = *catalog.get(&sale.product_code)?;
            Some(if sale.description.is_none() {
                sale.with_description(description)
            } else {
                sale
            })
        })
        .collect();

    let dropped = total - kept.len();
    if dropped > 0 {
        tracing::warn!("丟棄 {} 筆未設定產品的銷售", dropped);
    }
    (kept, dropped)
}
