//! 分配引擎主流程

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use yield_core::{
    EngineConfig, IntakeEvent, Product, ProductCode, SaleEvent, ShortfallEvent, StockEvent,
    YieldError,
};

use crate::merger::MovementMerger;
use crate::shortfall::ShortfallAnalyzer;
use crate::{RunResult, RunWarning};

/// 單次執行的狀態，只存在於 `process` 期間
#[derive(Debug, Default)]
struct RunContext {
    analyzer: ShortfallAnalyzer,
    intakes: Vec<IntakeEvent>,
    has_alerts: bool,
}

/// 分配引擎
///
/// 依時間重播合併後的事件：每次進貨按產出百分比分配給所有產品，
/// 每筆銷售扣減對應產品的帳本，缺貨則交給 [`ShortfallAnalyzer`]。
#[derive(Debug, Clone)]
pub struct AllocationEngine {
    /// 產品帳本（依代碼排序）
    products: BTreeMap<ProductCode, Product>,

    /// 引擎配置
    config: EngineConfig,
}

impl AllocationEngine {
    /// 創建新的分配引擎
    ///
    /// 產品代碼重複或百分比不在 0-100 之間時回傳錯誤。
    pub fn new(products: Vec<Product>, config: EngineConfig) -> yield_core::Result<Self> {
        let mut by_code = BTreeMap::new();
        for product in products {
            if product.percentage < Decimal::ZERO || product.percentage > Decimal::ONE_HUNDRED {
                return Err(YieldError::InvalidPercentage(format!(
                    "{}: {}",
                    product.code, product.percentage
                )));
            }
            let code = product.code;
            if by_code.insert(code, product).is_some() {
                return Err(YieldError::DuplicateProduct(code));
            }
        }

        Ok(Self {
            products: by_code,
            config,
        })
    }

    /// 合併進貨與銷售後執行分配
    pub fn load(
        self,
        intakes: Vec<IntakeEvent>,
        sales: Vec<SaleEvent>,
    ) -> yield_core::Result<RunResult> {
        let sequence = MovementMerger::merge(intakes, sales);
        self.process(&sequence)
    }

    /// 重播已排序的事件序列
    pub fn process(mut self, sequence: &[StockEvent]) -> yield_core::Result<RunResult> {
        tracing::info!(
            "開始分配計算：事件 {} 筆，產品 {} 項",
            sequence.len(),
            self.products.len()
        );

        let start_time = std::time::Instant::now();
        let mut ctx = RunContext::default();

        for event in sequence {
            match event {
                StockEvent::Intake(intake) => self.distribute_intake(intake, &mut ctx)?,
                StockEvent::Sale(sale) => self.apply_sale(sale, &mut ctx)?,
            }
        }

        let mut warnings = Vec::new();
        let percentage_total: Decimal = self.products.values().map(|p| p.percentage).sum();
        if !self.config.percentage_total_ok(percentage_total) {
            tracing::warn!("產出百分比總和 {} 不等於 100", percentage_total);
            warnings.push(RunWarning::PercentageTotal {
                total: percentage_total,
            });
        }

        tracing::debug!("彙總缺貨：{} 筆", ctx.analyzer.events().len());
        let summaries = ctx
            .analyzer
            .summarize(&ctx.intakes, self.config.attribution_mode);

        let result = RunResult {
            products: self.products.into_values().collect(),
            intakes: ctx.intakes,
            shortfalls: ctx.analyzer.into_events(),
            summaries,
            warnings,
            has_alerts: ctx.has_alerts,
            config: self.config,
            calculation_time_ms: Some(start_time.elapsed().as_millis()),
        };

        tracing::info!("分配計算完成，耗時 {:?}", start_time.elapsed());
        tracing::info!("缺貨筆數: {}", result.shortfalls.len());

        Ok(result)
    }

    /// 進貨分配到所有產品
    fn distribute_intake(
        &mut self,
        intake: &IntakeEvent,
        ctx: &mut RunContext,
    ) -> yield_core::Result<()> {
        if intake.quantity < Decimal::ZERO {
            return Err(YieldError::InvalidQuantity(format!(
                "進貨 {} 數量為負: {}",
                intake.timestamp, intake.quantity
            )));
        }

        tracing::debug!("進貨 {} → 分配 {} kg", intake.timestamp, intake.quantity);

        for product in self.products.values_mut() {
            let derived = product.derived_share(intake.quantity);
            if derived.is_zero() && !self.config.record_zero_share {
                continue;
            }
            product.apply_intake(intake.timestamp, derived);
        }

        ctx.intakes.push(intake.clone());
        Ok(())
    }

    /// 銷售扣減
    fn apply_sale(&mut self, sale: &SaleEvent, ctx: &mut RunContext) -> yield_core::Result<()> {
        if sale.quantity < Decimal::ZERO {
            return Err(YieldError::InvalidQuantity(format!(
                "銷售 {} 數量為負: {}",
                sale.product_code, sale.quantity
            )));
        }

        // 銷售應已在載入時過濾，找不到代表上游違約
        let product = self
            .products
            .get_mut(&sale.product_code)
            .ok_or(YieldError::UnknownProduct(sale.product_code))?;

        let outcome = product.apply_sale(sale.timestamp, sale.quantity, self.config.sale_policy);

        if let Some(balance_before) = outcome.balance_before() {
            let event = ShortfallEvent::new(
                product.code,
                sale.timestamp,
                sale.quantity,
                balance_before,
            );
            tracing::warn!(
                "庫存不足：產品 {} 於 {} 需求 {}，可用 {}，缺口 {}",
                product.code,
                sale.timestamp,
                sale.quantity,
                balance_before,
                event.missing
            );
            ctx.analyzer.record(event);
            ctx.has_alerts = true;
        }

        Ok(())
    }

    /// 獲取產品帳本
    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    /// 獲取引擎配置
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
