use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 单项核对: 计算值 vs 对照值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalsCheck {
    pub calculated: BigDecimal,
    pub expected: BigDecimal,
    pub matches: bool,
}

impl TotalsCheck {
    /// 严格相等, 不设容差
    pub fn new(calculated: BigDecimal, expected: BigDecimal) -> Self {
        let matches = calculated == expected;
        Self {
            calculated,
            expected,
            matches,
        }
    }
}

/// 单张发票的核对结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordCheck {
    pub quantity: TotalsCheck,
    pub amount: TotalsCheck,
}

impl RecordCheck {
    pub fn passed(&self) -> bool {
        self.quantity.matches && self.amount.matches
    }
}

/// 核对报告: 四项单据核对 + 两项跨发票比对
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub supplier: RecordCheck,
    pub client: RecordCheck,
    /// calculated = 供应商, expected = 客户
    pub quantity_match: TotalsCheck,
    pub amount_match: TotalsCheck,
}

impl ReconciliationReport {
    pub fn all_passed(&self) -> bool {
        self.supplier.passed()
            && self.client.passed()
            && self.quantity_match.matches
            && self.amount_match.matches
    }
}

fn verdict(ok: bool) -> &'static str {
    if ok {
        "OK ✅"
    } else {
        "MISMATCH ❌"
    }
}

fn write_check(f: &mut fmt::Formatter<'_>, label: &str, check: &TotalsCheck) -> fmt::Result {
    writeln!(
        f,
        "{}: {} vs {} — {}",
        label,
        check.calculated,
        check.expected,
        verdict(check.matches)
    )
}

impl fmt::Display for ReconciliationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "📊 Reconciliation results:")?;
        writeln!(f)?;
        writeln!(f, "🔹 Supplier Invoice:")?;
        write_check(f, "Total Amount", &self.supplier.amount)?;
        write_check(f, "Total Quantity", &self.supplier.quantity)?;
        writeln!(f)?;
        writeln!(f, "🔹 Client Invoice:")?;
        write_check(f, "Total Amount", &self.client.amount)?;
        write_check(f, "Total Quantity", &self.client.quantity)?;
        writeln!(f)?;
        writeln!(f, "🔸 Supplier vs Client:")?;
        write_check(f, "Total Quantity", &self.quantity_match)?;
        write!(
            f,
            "Total Amount: {} vs {} — {}",
            self.amount_match.calculated,
            self.amount_match.expected,
            verdict(self.amount_match.matches)
        )
    }
}
