//! 巴西格式的數字與日期處理
//!
//! 輸入檔使用逗號作為小數點、日期為 `DD/MM/YY`。

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

/// 日期格式
pub const DATE_FORMAT: &str = "%d/%m/%y";

/// 時間格式
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// 解析逗號小數（"12,345" → 12.345）
pub fn parse_decimal(value: &str) -> Result<Decimal, String> {
    let normalized = value.trim().replace(',', ".");
    Decimal::from_str(&normalized).map_err(|e| format!("無效的數字 '{}': {}", value, e))
}

/// 解析 `DD/MM/YY` 日期
pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|e| format!("無效的日期 '{}': {}", value, e))
}

/// 解析時間，不足八碼時左側補零（"8:05:00" → "08:05:00"）
pub fn parse_time(value: &str) -> Result<NaiveTime, String> {
    let padded = format!("{:0>8}", value.trim());
    NaiveTime::parse_from_str(&padded, TIME_FORMAT)
        .map_err(|e| format!("無效的時間 '{}': {}", value, e))
}

/// 合併日期與可選時間，無時間時取零時
pub fn combine(date: NaiveDate, time: Option<&str>) -> Result<NaiveDateTime, String> {
    let time = match time.map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) => parse_time(t)?,
        None => NaiveTime::MIN,
    };
    Ok(date.and_time(time))
}

/// 固定小數位數
pub fn fixed(value: Decimal, dp: u32) -> String {
    format!("{:.*}", dp as usize, value.round_dp(dp))
}

/// 固定小數位數，以逗號作為小數點
pub fn fixed_comma(value: Decimal, dp: u32) -> String {
    fixed(value, dp).replace('.', ",")
}

/// serde：逗號小數
pub fn deserialize_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_decimal(&s).map_err(serde::de::Error::custom)
}

/// serde：`DD/MM/YY` 日期
pub fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_date(&s).map_err(serde::de::Error::custom)
}
