use crate::models::{round_currency, InvoiceRecord, ReconciliationReport, RecordCheck, TotalsCheck};
use bigdecimal::{BigDecimal, Zero};

/// 由明细重新计算的合计
#[derive(Debug, Clone, PartialEq)]
pub struct CalculatedTotals {
    pub quantity: BigDecimal,
    /// Σ(数量 × 单价), 对总和做一次舍入
    pub amount: BigDecimal,
}

/// 累加明细, 中间结果保持全精度
pub fn calculate_totals(record: &InvoiceRecord) -> CalculatedTotals {
    let mut quantity = BigDecimal::zero();
    let mut amount = BigDecimal::zero();
    for item in &record.items {
        quantity += &item.quantity;
        amount += item.amount();
    }
    CalculatedTotals {
        quantity,
        amount: round_currency(&amount),
    }
}

/// 计算值与表头声明值对比
pub fn check_record(record: &InvoiceRecord, totals: &CalculatedTotals) -> RecordCheck {
    RecordCheck {
        quantity: TotalsCheck::new(totals.quantity.clone(), record.total_quantity.clone()),
        amount: TotalsCheck::new(totals.amount.clone(), round_currency(&record.total_amount)),
    }
}

/// 核对两张发票; 所有检查都会执行, 不因前面的失败而中断
pub fn reconcile(supplier: &InvoiceRecord, client: &InvoiceRecord) -> ReconciliationReport {
    let supplier_totals = calculate_totals(supplier);
    let client_totals = calculate_totals(client);

    let report = ReconciliationReport {
        supplier: check_record(supplier, &supplier_totals),
        client: check_record(client, &client_totals),
        quantity_match: TotalsCheck::new(supplier_totals.quantity, client_totals.quantity),
        amount_match: TotalsCheck::new(supplier_totals.amount, client_totals.amount),
    };

    if report.all_passed() {
        tracing::info!("Reconciliation passed for {} / {}", supplier.invoice_number, client.invoice_number);
    } else {
        tracing::warn!(
            "Reconciliation mismatch for {} / {}: supplier={}, client={}, quantity_match={}, amount_match={}",
            supplier.invoice_number,
            client.invoice_number,
            report.supplier.passed(),
            report.client.passed(),
            report.quantity_match.matches,
            report.amount_match.matches
        );
    }
    report
}
