//! 草稿發票合併範例

use erp_core::*;
use erp_invoice::{InvoiceMergingService, MergeOverrides};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("===== Invoice Merge Example =====\n");

    let drafts = vec![
        Invoice::draft(InvoiceOperationType::ClientSale, "ACME", "CUST-042", "EUR")
            .with_payment_condition("NET30")
            .with_project("PRJ-BIKES")
            .with_line(InvoiceLine::new("Frame assembly", Decimal::from(4), Decimal::from(120))),
        Invoice::draft(InvoiceOperationType::ClientSale, "ACME", "CUST-042", "EUR")
            .with_payment_condition("NET45")
            .with_project("PRJ-BIKES")
            .with_line(InvoiceLine::new("Wheel truing", Decimal::from(8), Decimal::from(15))),
    ];

    let service = InvoiceMergingService::new(InvoiceMergeConfig::default());

    // 付款條件不同，需由使用者選定
    match service.merge(&drafts, &MergeOverrides::new()) {
        Ok(_) => println!("[1] Merged without choices"),
        Err(err) => println!("[1] Merge refused: {err}"),
    }

    let merged = service.merge(&drafts, &MergeOverrides::new().with_payment_condition("NET30"))?;
    println!("[2] Merged {} invoices into {}", merged.merged_from.len(), merged.invoice.id);
    for line in &merged.invoice.lines {
        println!("    - {} x{} @ {}", line.description, line.quantity, line.unit_price);
    }
    println!("    Ex-tax total: {}", merged.invoice.ex_tax_total());

    Ok(())
}
