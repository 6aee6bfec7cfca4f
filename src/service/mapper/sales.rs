use super::{optional_number, total_amount, validate_items, vat_amount, Field, Projection};
use crate::error::InvoiceError;
use crate::models::{FieldValue, InvoiceRecord, LineItem, Sheet};
use crate::service::{format_known_date, normalize_description};
use indexmap::IndexMap;

/// Sales Invoice (出库) 表的一行: 一条客户明细
pub struct SalesRow<'a> {
    pub supplier: &'a InvoiceRecord,
    pub client: &'a InvoiceRecord,
    pub item: &'a LineItem,
    /// 按 SKU 匹配到的供应商明细
    pub matched: Option<&'a LineItem>,
    pub date: &'a str,
}

impl SalesRow<'_> {
    /// 优先使用供应商明细的描述
    fn content(&self) -> String {
        let description = self
            .matched
            .map(|m| m.description.as_str())
            .unwrap_or(self.item.description.as_str());
        normalize_description(description)
    }
}

pub fn sales_projection<'a>() -> Projection<SalesRow<'a>> {
    Projection::new(
        "Sales Invoice",
        vec![
            Field::text("Date", 15.0, |r| FieldValue::text(r.date)),
            Field::text("Invoice Number", 20.0, |r| {
                FieldValue::text(r.client.invoice_number.as_str())
            }),
            // 客户名取自供应商发票的 buyer 字段
            Field::new("Customer Name", 30.0, |r| FieldValue::text(r.supplier.buyer.as_str())),
            Field::new("Emirate", 15.0, |_| FieldValue::text("Dubai")),
            Field::new("Warehouse", 15.0, |_| FieldValue::empty()),
            Field::new("Item", 20.0, |r| FieldValue::text(r.item.sku.as_str())),
            Field::new("Content", 40.0, |r| FieldValue::Text(r.content())),
            Field::new("Document Currency", 10.0, |_| FieldValue::text("USD")),
            Field::new("Quantity", 10.0, |r| optional_number(&r.item.quantity)),
            Field::new("UOM", 10.0, |_| FieldValue::empty()),
            Field::new("Price", 10.0, |r| optional_number(&r.item.unit_price)),
            Field::new("Inclusive of VAT", 15.0, |_| FieldValue::text("No")),
            Field::new("VAT, %", 15.0, |_| FieldValue::text("Out of Scope")),
            Field::new("VAT Amount", 15.0, |_| vat_amount()),
            Field::new("Total Amount", 15.0, |r| total_amount(r.item)),
        ],
    )
}

/// SKU -> 第一条供应商明细
fn sku_index(items: &[LineItem]) -> IndexMap<&str, &LineItem> {
    let mut index = IndexMap::with_capacity(items.len());
    for item in items {
        index.entry(item.sku.as_str()).or_insert(item);
    }
    index
}

/// 每条客户明细一行, 描述按 SKU 从供应商明细中获取
pub fn map_sales(supplier: &InvoiceRecord, client: &InvoiceRecord) -> Result<Sheet, InvoiceError> {
    validate_items("Sales Invoice", &client.items)?;

    let index = sku_index(&supplier.items);
    let date = format_known_date(&client.invoice_date);

    let mut unmatched = 0usize;
    let rows: Vec<SalesRow> = client
        .items
        .iter()
        .map(|item| {
            let matched = index.get(item.sku.as_str()).copied();
            if matched.is_none() {
                unmatched += 1;
            }
            SalesRow {
                supplier,
                client,
                item,
                matched,
                date: &date,
            }
        })
        .collect();

    if unmatched > 0 {
        tracing::warn!(
            "Sales Invoice {}: {} of {} client items have no supplier SKU match",
            client.invoice_number,
            unmatched,
            rows.len()
        );
    }

    Ok(sales_projection().project(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use pretty_assertions::assert_eq;

    fn item(sku: &str, description: &str) -> LineItem {
        LineItem {
            sku: sku.to_string(),
            description: description.to_string(),
            quantity: BigDecimal::from(2),
            unit_price: BigDecimal::from(3),
            ..Default::default()
        }
    }

    fn pair() -> (InvoiceRecord, InvoiceRecord) {
        let supplier = InvoiceRecord {
            buyer: "Gulf Auto Parts FZE".to_string(),
            items: vec![
                item("X1", "Brake Pad"),
                item("X1", "Duplicate row"),
                item("", "No sku"),
            ],
            ..Default::default()
        };
        let client = InvoiceRecord {
            invoice_number: "C-17".to_string(),
            invoice_date: "2025-03-18".to_string(),
            buyer: "Client's own buyer".to_string(),
            items: vec![item("X1", "Колодки тормозные"), item("Z9", "Oil FILTER 10W")],
            ..Default::default()
        };
        (supplier, client)
    }

    #[test]
    fn content_comes_from_first_supplier_match() {
        let (supplier, client) = pair();
        let sheet = map_sales(&supplier, &client).unwrap();
        assert_eq!(sheet.value(0, "Content"), Some(&FieldValue::text("Brake pad")));
    }

    #[test]
    fn falls_back_to_client_description() {
        let (supplier, client) = pair();
        let sheet = map_sales(&supplier, &client).unwrap();
        assert_eq!(sheet.value(1, "Content"), Some(&FieldValue::text("Oil filter w")));
        assert_eq!(sheet.value(1, "Item"), Some(&FieldValue::text("Z9")));
    }

    #[test]
    fn empty_sku_matches_first_empty_supplier_sku() {
        let (mut supplier, mut client) = pair();
        supplier.items.push(item("", "Second blank"));
        client.items = vec![item("", "Колодки")];
        let sheet = map_sales(&supplier, &client).unwrap();
        assert_eq!(sheet.value(0, "Content"), Some(&FieldValue::text("No sku")));
    }

    #[test]
    fn empty_sku_without_supplier_counterpart_uses_client_description() {
        let (mut supplier, mut client) = pair();
        supplier.items.retain(|i| !i.sku.is_empty());
        client.items = vec![item("", "Generic part")];
        let sheet = map_sales(&supplier, &client).unwrap();
        assert_eq!(sheet.value(0, "Content"), Some(&FieldValue::text("Generic part")));
    }

    #[test]
    fn customer_name_is_supplier_buyer() {
        let (supplier, client) = pair();
        let sheet = map_sales(&supplier, &client).unwrap();
        assert_eq!(
            sheet.value(0, "Customer Name"),
            Some(&FieldValue::text("Gulf Auto Parts FZE"))
        );
    }

    #[test]
    fn date_and_fixed_columns() {
        let (supplier, client) = pair();
        let sheet = map_sales(&supplier, &client).unwrap();
        assert_eq!(sheet.value(0, "Date"), Some(&FieldValue::text("18/03/2025")));
        assert_eq!(sheet.value(0, "Invoice Number"), Some(&FieldValue::text("C-17")));
        assert_eq!(sheet.value(0, "Emirate"), Some(&FieldValue::text("Dubai")));
        assert_eq!(sheet.value(0, "Total Amount"), Some(&FieldValue::text("6.00")));
        assert_eq!(sheet.headers().len(), 15);
        assert_eq!(sheet.headers()[14], "Total Amount");
    }

    #[test]
    fn unparseable_date_is_kept_raw() {
        let (supplier, mut client) = pair();
        client.invoice_date = "3/18/25".to_string();
        let sheet = map_sales(&supplier, &client).unwrap();
        assert_eq!(sheet.value(0, "Date"), Some(&FieldValue::text("3/18/25")));
    }

    #[test]
    fn one_row_per_client_item() {
        let (supplier, mut client) = pair();
        client.items.push(item("X1", "again"));
        let sheet = map_sales(&supplier, &client).unwrap();
        assert_eq!(sheet.rows.len(), 3);
    }
}
