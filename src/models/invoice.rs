use bigdecimal::{BigDecimal, RoundingMode, Zero};
use serde::{Deserialize, Serialize};

/// 金额保留位数
pub const CURRENCY_SCALE: i64 = 2;

/// 金额四舍五入 (half-up, 两位小数)
pub fn round_currency(value: &BigDecimal) -> BigDecimal {
    value.with_scale_round(CURRENCY_SCALE, RoundingMode::HalfUp)
}

/// 规范化的发票记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub invoice_number: String,
    pub invoice_date: String,   // 原始日期字符串, 未规范化
    pub buyer: String,
    pub seller: String,
    pub payment_term: Option<String>,
    pub packing: Option<String>,
    pub contract: Option<String>,
    pub items: Vec<LineItem>,
    pub total_quantity: BigDecimal,  // 表头声明的总数量
    pub total_amount: BigDecimal,    // 表头声明的总金额
}

impl Default for InvoiceRecord {
    fn default() -> Self {
        Self {
            invoice_number: String::new(),
            invoice_date: String::new(),
            buyer: String::new(),
            seller: String::new(),
            payment_term: None,
            packing: None,
            contract: None,
            items: Vec::new(),
            total_quantity: BigDecimal::zero(),
            total_amount: BigDecimal::zero(),
        }
    }
}

impl InvoiceRecord {
    /// 输出文件夹名: 发票号中的空格替换为下划线
    pub fn folder(&self) -> String {
        self.invoice_number.replace(' ', "_")
    }
}

/// 发票明细行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub sku: String,
    pub description: String,
    pub quantity: BigDecimal,
    pub unit_price: BigDecimal,
    pub total: BigDecimal,
}

impl Default for LineItem {
    fn default() -> Self {
        Self {
            sku: String::new(),
            description: String::new(),
            quantity: BigDecimal::zero(),
            unit_price: BigDecimal::zero(),
            total: BigDecimal::zero(),
        }
    }
}

impl LineItem {
    /// 数量 × 单价 (不做舍入)
    pub fn amount(&self) -> BigDecimal {
        &self.quantity * &self.unit_price
    }

    /// 行金额, 数量或单价缺失 (为 0) 时返回 None
    pub fn rounded_amount(&self) -> Option<BigDecimal> {
        if self.quantity.is_zero() || self.unit_price.is_zero() {
            return None;
        }
        Some(round_currency(&self.amount()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn rounds_half_up() {
        assert_eq!(round_currency(&dec("25.005")).to_string(), "25.01");
        assert_eq!(round_currency(&dec("25.004")).to_string(), "25.00");
        assert_eq!(round_currency(&dec("10")).to_string(), "10.00");
    }

    #[test]
    fn folder_replaces_every_space() {
        let record = InvoiceRecord {
            invoice_number: "M04 ADR 0301".to_string(),
            ..Default::default()
        };
        assert_eq!(record.folder(), "M04_ADR_0301");
    }

    #[test]
    fn rounded_amount_is_none_when_factor_missing() {
        let item = LineItem {
            quantity: dec("3"),
            ..Default::default()
        };
        assert!(item.rounded_amount().is_none());
    }
}
