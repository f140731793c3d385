//! # Yield IO
//!
//! CSV 載入、結果輸出與文字報表

pub mod loader;
pub mod locale;
pub mod report;
pub mod writer;

pub use loader::{
    load_intakes, load_intakes_file, load_products, load_products_file, load_sales,
    load_sales_file, retain_known,
};
pub use report::{write_cut_analysis_report, write_recalibration, StockReport};
pub use writer::{write_cut_analysis, write_recommended_percentages, write_summary_json};

use thiserror::Error;

/// 載入與輸出錯誤類型
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("無法開啟檔案 {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("第 {line} 行解析失敗: {source}")]
    Csv {
        line: usize,
        #[source]
        source: csv::Error,
    },

    #[error("第 {line} 行欄位 {field} 無效: {message}")]
    Field {
        line: usize,
        field: &'static str,
        message: String,
    },

    #[error("CSV 寫入失敗: {0}")]
    Write(#[from] csv::Error),

    #[error("IO 錯誤: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON 序列化失敗: {0}")]
    Json(#[from] serde_json::Error),
}
