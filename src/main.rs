mod config;

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::time::Instant;
use yield_calc::FifoCutAllocator;
use yield_io::StockReport;

use crate::config::RunConfig;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = RunConfig::from_env().context("配置錯誤")?;
    run(&config)
}

fn run(config: &RunConfig) -> Result<()> {
    let start = Instant::now();

    let products = yield_io::load_products_file(&config.percentages_path)
        .with_context(|| format!("載入百分比失敗: {}", config.percentages_path.display()))?;
    let intakes = yield_io::load_intakes_file(&config.intakes_path)
        .with_context(|| format!("載入進貨失敗: {}", config.intakes_path.display()))?;
    let sales = yield_io::load_sales_file(&config.sales_path)
        .with_context(|| format!("載入銷售失敗: {}", config.sales_path.display()))?;
    let (sales, _dropped) = yield_io::retain_known(sales, &products);

    tracing::info!(
        "已載入 {} 個產品、{} 筆進貨、{} 筆銷售",
        products.len(),
        intakes.len(),
        sales.len()
    );

    // FIFO 分析使用原始事件，分配引擎會取得所有權
    let cut_inputs = config
        .cut_analysis
        .then(|| (intakes.clone(), sales.clone()));

    let result = yield_calc::load(products, intakes, sales, config.engine_config())
        .context("分配計算失敗")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let report =
        StockReport::new(&result).with_base_product(config.base_code, &config.base_description);
    report.write_shortfall_alerts(&mut out)?;
    report.write_summary(&mut out)?;
    if let Some(code) = config.movements_for {
        report.write_movements(&mut out, Some(code))?;
    }

    if result.has_alerts() {
        let recalibration = result.recalibration();
        yield_io::write_recalibration(&mut out, &recalibration)?;

        let file = File::create(&config.ideal_output_path).with_context(|| {
            format!("無法建立 {}", config.ideal_output_path.display())
        })?;
        yield_io::write_recommended_percentages(BufWriter::new(file), &recalibration)?;
        writeln!(out, "建議百分比已寫入 {}", config.ideal_output_path.display())?;
    } else {
        writeln!(out)?;
        writeln!(out, "沒有缺貨，現行百分比不需調整")?;
    }

    if let Some((lots, orders)) = cut_inputs {
        let analysis = FifoCutAllocator::allocate(&lots, &orders);
        yield_io::write_cut_analysis_report(&mut out, &analysis)?;

        let file = File::create(&config.cuts_output_path)
            .with_context(|| format!("無法建立 {}", config.cuts_output_path.display()))?;
        yield_io::write_cut_analysis(BufWriter::new(file), &analysis)?;
        writeln!(out, "分切分析已寫入 {}", config.cuts_output_path.display())?;
    }

    if let Some(path) = &config.summary_json_path {
        let file =
            File::create(path).with_context(|| format!("無法建立 {}", path.display()))?;
        yield_io::write_summary_json(BufWriter::new(file), &result)?;
        writeln!(out, "執行摘要已寫入 {}", path.display())?;
    }

    tracing::info!("完成，耗時 {} ms", start.elapsed().as_millis());
    Ok(())
}
