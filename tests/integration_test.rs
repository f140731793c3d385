//! 集成測試

use chrono::NaiveDate;
use rstest::rstest;
use rust_decimal::Decimal;
use yield_calc::{AllocationEngine, FifoCutAllocator, MovementMerger};
use yield_core::*;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 10, d).unwrap()
}

fn two_products() -> Vec<Product> {
    vec![
        Product::new(1, "A", Decimal::from(60)),
        Product::new(2, "B", Decimal::from(40)),
    ]
}

#[rstest]
#[case(SalePolicy::Strict, Decimal::from(60))]
#[case(SalePolicy::Permissive, Decimal::from(-10))]
fn test_shortfall_scenario(#[case] policy: SalePolicy, #[case] expected_balance: Decimal) {
    // {A:60, B:40}，第1天進貨 100，第2天 A 銷售 70
    let result = yield_calc::load(
        two_products(),
        vec![IntakeEvent::on_date(day(1), Decimal::from(100))],
        vec![SaleEvent::on_date(day(2), 1, Decimal::from(70))],
        EngineConfig::new().with_sale_policy(policy),
    )
    .unwrap();

    assert!(result.has_alerts());
    assert_eq!(result.shortfalls.len(), 1);
    assert_eq!(result.shortfalls[0].missing, Decimal::from(10));

    let a = result.product(1).unwrap();
    assert_eq!(a.balance, expected_balance);
    assert_eq!(a.balance, a.total_intake() - a.total_sale());
    assert_eq!(result.product(2).unwrap().balance, Decimal::from(40));

    let summary = result.summary_for(1).unwrap();
    assert_eq!(summary.worst_day, day(2));
    assert_eq!(summary.worst_day_attempts, 1);
    assert_eq!(summary.percent_of_lot(), Some(Decimal::from(10)));

    // 有缺貨的產品在建議百分比中變大，總和不變
    let ideal = result.recalibrate();
    assert!(ideal[&1] > Decimal::from(60));
    assert!(ideal[&2] < Decimal::from(40));
    assert_eq!(ideal[&1] + ideal[&2], Decimal::from(100));
}

#[test]
fn test_fifo_two_lots_scenario() {
    let lots = vec![
        IntakeEvent::on_date(day(1), Decimal::from(50)),
        IntakeEvent::on_date(day(3), Decimal::from(50)),
    ];
    let sales = vec![SaleEvent::on_date(day(4), 1, Decimal::from(90)).with_description("A")];

    let analysis = FifoCutAllocator::allocate(&lots, &sales);

    assert_eq!(analysis.lots.len(), 2);
    assert_eq!(analysis.lots[0].allocated, Decimal::from(50));
    assert_eq!(analysis.lots[0].cuts[0].percent, Decimal::from(100));
    assert_eq!(analysis.lots[1].allocated, Decimal::from(40));
    assert_eq!(analysis.lots[1].cuts[0].percent, Decimal::from(80));
}

#[test]
fn test_replay_is_idempotent() {
    let intakes = vec![
        IntakeEvent::on_date(day(1), Decimal::from(100)),
        IntakeEvent::on_date(day(3), Decimal::new(555, 1)),
    ];
    let sales = vec![
        SaleEvent::on_date(day(2), 1, Decimal::from(30)),
        SaleEvent::on_date(day(2), 2, Decimal::from(50)),
        SaleEvent::on_date(day(4), 1, Decimal::new(125, 1)),
    ];
    let sequence = MovementMerger::merge(intakes, sales);

    let first = AllocationEngine::new(two_products(), EngineConfig::default())
        .unwrap()
        .process(&sequence)
        .unwrap();
    let second = AllocationEngine::new(two_products(), EngineConfig::default())
        .unwrap()
        .process(&sequence)
        .unwrap();

    assert_eq!(first.products, second.products);
    assert_eq!(first.shortfalls, second.shortfalls);
    assert_eq!(first.summaries, second.summaries);
}

#[test]
fn test_same_timestamp_intake_before_sale() {
    // 同一時間的進貨先於銷售處理
    let result = yield_calc::load(
        two_products(),
        vec![IntakeEvent::on_date(day(1), Decimal::from(100))],
        vec![SaleEvent::on_date(day(1), 1, Decimal::from(60))],
        EngineConfig::default(),
    )
    .unwrap();

    assert!(!result.has_alerts());
    assert_eq!(result.product(1).unwrap().balance, Decimal::ZERO);
}

#[test]
fn test_duplicate_product_rejected() {
    let products = vec![
        Product::new(1, "A", Decimal::from(50)),
        Product::new(1, "A2", Decimal::from(50)),
    ];
    let err = AllocationEngine::new(products, EngineConfig::default()).unwrap_err();
    assert!(matches!(err, YieldError::DuplicateProduct(1)));
}

#[test]
fn test_csv_end_to_end() {
    let percentages = "\
SEQPRODUTO;DESCCOMPLETA;PERCENTUAL
1;ACEM KG;60,00
2;PATINHO KG;40,00
";
    let intakes = "\
DATA;HORA;QUANTIDADE
01/10/24;06:00:00;100
";
    let sales = "\
DATA;HORA;SEQPRODUTO;QUANTIDADE
02/10/24;9:15:00;1;70
02/10/24;10:00:00;2;15,5
02/10/24;11:00:00;777;5
";

    let products = yield_io::load_products(percentages.as_bytes()).unwrap();
    let intakes = yield_io::load_intakes(intakes.as_bytes()).unwrap();
    let sales = yield_io::load_sales(sales.as_bytes()).unwrap();
    let (sales, dropped) = yield_io::retain_known(sales, &products);
    assert_eq!(dropped, 1);

    let result = yield_calc::load(products, intakes, sales, EngineConfig::default()).unwrap();

    assert!(result.has_alerts());
    assert_eq!(result.product(2).unwrap().balance, Decimal::new(245, 1));

    let mut report = Vec::new();
    let stock = yield_io::StockReport::new(&result).with_base_product(25274, "CARNE BOV RSF KG");
    stock.write_shortfall_alerts(&mut report).unwrap();
    stock.write_summary(&mut report).unwrap();
    let text = String::from_utf8(report).unwrap();
    assert!(text.contains("ACEM KG"));
    assert!(text.contains("缺口 10.000"));

    let mut ideal_csv = Vec::new();
    yield_io::write_recommended_percentages(&mut ideal_csv, &result.recalibration()).unwrap();
    let reloaded = yield_io::load_products(ideal_csv.as_slice()).unwrap();
    assert_eq!(reloaded.len(), 2);
    let total: Decimal = reloaded.iter().map(|p| p.percentage).sum();
    assert_eq!(total, Decimal::from(100));
}
