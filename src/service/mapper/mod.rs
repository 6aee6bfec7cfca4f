//! 发票记录 -> 1C 导入表的投影
//!
//! 三种输出表共用 [`Projection`]: 每列由列定义和一个取值函数组成,
//! 列顺序即输出顺序。

mod inv;
mod items;
mod sales;

pub use inv::{inv_projection, map_inv, InvRow};
pub use items::{items_projection, map_items, ItemsRow};
pub use sales::{map_sales, sales_projection, SalesRow};

use crate::error::InvoiceError;
use crate::models::{ColumnSpec, FieldValue, LineItem, Sheet};
use bigdecimal::{BigDecimal, Signed, Zero};

/// 单列: 列定义 + 取值函数
pub struct Field<R> {
    pub spec: ColumnSpec,
    pub extract: fn(&R) -> FieldValue,
}

impl<R> Field<R> {
    pub fn new(header: &'static str, width: f64, extract: fn(&R) -> FieldValue) -> Self {
        Self {
            spec: ColumnSpec {
                header,
                width,
                text_format: false,
            },
            extract,
        }
    }

    /// 文本格式列 (Excel "@")
    pub fn text(header: &'static str, width: f64, extract: fn(&R) -> FieldValue) -> Self {
        Self {
            spec: ColumnSpec {
                header,
                width,
                text_format: true,
            },
            extract,
        }
    }
}

/// 行投影: 有序列表
pub struct Projection<R> {
    pub name: &'static str,
    pub fields: Vec<Field<R>>,
}

impl<R> Projection<R> {
    pub fn new(name: &'static str, fields: Vec<Field<R>>) -> Self {
        Self { name, fields }
    }

    pub fn columns(&self) -> Vec<ColumnSpec> {
        self.fields.iter().map(|f| f.spec).collect()
    }

    pub fn project_row(&self, row: &R) -> Vec<FieldValue> {
        self.fields.iter().map(|f| (f.extract)(row)).collect()
    }

    pub fn project(&self, rows: impl IntoIterator<Item = R>) -> Sheet {
        Sheet {
            name: self.name,
            columns: self.columns(),
            rows: rows.into_iter().map(|r| self.project_row(&r)).collect(),
        }
    }
}

/// 数量和单价不能为负
pub(crate) fn validate_items(schema: &'static str, items: &[LineItem]) -> Result<(), InvoiceError> {
    for (row, item) in items.iter().enumerate() {
        let reason = if item.quantity.is_negative() {
            format!("negative quantity {} for sku {:?}", item.quantity, item.sku)
        } else if item.unit_price.is_negative() {
            format!("negative unit price {} for sku {:?}", item.unit_price, item.sku)
        } else {
            continue;
        };
        return Err(InvoiceError::Mapping { schema, row, reason });
    }
    Ok(())
}

/// 0 视为缺失, 输出空字符串
pub(crate) fn optional_number(value: &BigDecimal) -> FieldValue {
    if value.is_zero() {
        FieldValue::empty()
    } else {
        FieldValue::Number(value.clone())
    }
}

/// round(数量 × 单价, 2), 固定两位小数文本
pub(crate) fn total_amount(item: &LineItem) -> FieldValue {
    match item.rounded_amount() {
        Some(amount) => FieldValue::Text(amount.to_string()),
        None => FieldValue::empty(),
    }
}

pub(crate) fn vat_amount() -> FieldValue {
    FieldValue::Number(BigDecimal::zero())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn projection_keeps_field_order() {
        let projection: Projection<(i32, &str)> = Projection::new(
            "Pairs",
            vec![
                Field::new("b", 5.0, |r| FieldValue::text(r.1)),
                Field::text("a", 10.0, |r| FieldValue::text(r.0.to_string())),
            ],
        );
        let sheet = projection.project(vec![(1, "x"), (2, "y")]);
        assert_eq!(sheet.headers(), vec!["b", "a"]);
        assert!(sheet.columns[1].text_format);
        assert_eq!(sheet.rows[1], vec![FieldValue::text("y"), FieldValue::text("2")]);
    }

    #[test]
    fn total_amount_is_two_decimal_text() {
        let item = LineItem {
            quantity: BigDecimal::from(5),
            unit_price: BigDecimal::from(2),
            ..Default::default()
        };
        assert_eq!(total_amount(&item), FieldValue::text("10.00"));

        let item = LineItem {
            quantity: BigDecimal::from(3),
            unit_price: BigDecimal::from_str("0.3335").unwrap(),
            ..Default::default()
        };
        assert_eq!(total_amount(&item), FieldValue::text("1.00"));

        let missing_price = LineItem {
            quantity: BigDecimal::from(3),
            ..Default::default()
        };
        assert_eq!(total_amount(&missing_price), FieldValue::empty());
    }

    #[test]
    fn negative_quantity_is_a_mapping_error() {
        let items = vec![
            LineItem::default(),
            LineItem {
                sku: "B".to_string(),
                quantity: BigDecimal::from(-1),
                ..Default::default()
            },
        ];
        match validate_items("Inv", &items) {
            Err(InvoiceError::Mapping { schema, row, .. }) => {
                assert_eq!(schema, "Inv");
                assert_eq!(row, 1);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
