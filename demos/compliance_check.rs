//! 庫存合規檢查範例
//!
//! 展示從庫位結構、規則到合規報告的完整流程

use chrono::NaiveDate;
use erp_calc::{select_lines_to_check, ComplianceBatch, InMemoryRuleStore};
use erp_core::*;
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("===== Stock Compliance Check Example =====\n");

    // 步驟 1: 庫位結構
    println!("[1] Build Location Tree");
    let tree = LocationTree::new(vec![
        StockLocation::new("WH"),
        StockLocation::new("WH-RAW").with_parent("WH"),
        StockLocation::new("WH-RAW-BIN1").with_parent("WH-RAW"),
        StockLocation::new("WH-FG").with_parent("WH"),
    ]);
    println!("    Locations: {}\n", tree.len());

    // 步驟 2: 庫存快照與異動
    println!("[2] Load Stock Snapshot");
    let stock = vec![
        LocationSnapshot::new("WH-RAW", "STEEL-TUBE", Decimal::from(12), Decimal::from(60)),
        LocationSnapshot::new("WH-RAW-BIN1", "STEEL-TUBE", Decimal::from(4), Decimal::from(4)),
        LocationSnapshot::new("WH-FG", "BIKE-001", Decimal::from(3), Decimal::from(8)),
    ];
    let moves = vec![
        StockMoveRecord::realized(
            "WH-RAW-BIN1",
            "STEEL-TUBE",
            NaiveDate::from_ymd_opt(2025, 11, 3)
                .and_then(|d| d.and_hms_opt(14, 0, 0))
                .ok_or_else(|| anyhow::anyhow!("invalid date"))?,
        ),
        StockMoveRecord::realized(
            "WH-FG",
            "BIKE-001",
            NaiveDate::from_ymd_opt(2025, 11, 4)
                .and_then(|d| d.and_hms_opt(9, 30, 0))
                .ok_or_else(|| anyhow::anyhow!("invalid date"))?,
        ),
    ];
    for line in &stock {
        println!(
            "    {} @ {}: current {}, future {}",
            line.product_id, line.location_id, line.current_qty, line.future_qty
        );
    }
    println!();

    // 步驟 3: 規則
    println!("[3] Configure Stock Rules");
    let store = InMemoryRuleStore::new(vec![
        control("STEEL-TUBE", "WH-RAW", RuleType::Current, 25)
            .with_ideal_qty(Decimal::from(80))
            .with_reorder_qty(Decimal::from(20)),
        control("STEEL-TUBE", "WH-RAW", RuleType::Future, 25),
        control("BIKE-001", "WH", RuleType::Current, 2)
            .with_max_qty(Decimal::from(10)),
    ]);
    println!("    Rules: {}\n", store.rules().len());

    // 步驟 4: 執行批次
    println!("[4] Run Compliance Batch");
    let config = ComplianceBatchConfig::from_json_str(
        r#"{ "fetch_limit": 50, "run_from_last_execution": true,
             "last_successful_run": "2025-11-01T00:00:00" }"#,
    )?;
    let lines = select_lines_to_check(&stock, &moves, &config)?;
    let started_at = NaiveDate::from_ymd_opt(2025, 11, 5)
        .and_then(|d| d.and_hms_opt(2, 0, 0))
        .ok_or_else(|| anyhow::anyhow!("invalid date"))?;
    let report = ComplianceBatch::new(&config, &tree, &store, &stock).run(&lines, started_at)?;

    println!("    Done: {}, Anomalies: {}", report.done, report.anomaly);
    for violation in &report.violations {
        println!(
            "    ! {} @ {} ({:?}): {} < min {} (rule at {}), order {}",
            violation.product_id,
            violation.location_id,
            violation.rule_type,
            violation.aggregate_qty,
            violation.min_qty,
            violation.rule_location_id,
            violation.qty_to_order
        );
    }
    println!("\n    Next watermark: {}", report.next_watermark);

    Ok(())
}

fn control(product: &str, location: &str, rule_type: RuleType, min: i64) -> StockRule {
    StockRule::new(product, location, UseCase::StockControl, rule_type, Decimal::from(min))
}
