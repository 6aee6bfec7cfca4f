use super::{validate_items, Field, Projection};
use crate::error::InvoiceError;
use crate::models::{FieldValue, InvoiceRecord, LineItem, Sheet};

/// Items 表的一行: 一条供应商明细
pub struct ItemsRow<'a> {
    pub item: &'a LineItem,
    pub folder: &'a str,
}

/// Items 列定义, 除 item name / folder / sku 外均为固定值
pub fn items_projection<'a>() -> Projection<ItemsRow<'a>> {
    Projection::new(
        "Items",
        vec![
            Field::new("item name", 40.0, |r| FieldValue::text(r.item.description.as_str())),
            Field::new("folder", 30.0, |r| FieldValue::text(r.folder)),
            Field::new("sku", 20.0, |r| FieldValue::text(r.item.sku.as_str())),
            Field::new("uom", 10.0, |_| FieldValue::empty()),
            Field::new("Item Type", 20.0, |_| FieldValue::text("Inventory Item")),
            Field::new("Barcode", 20.0, |_| FieldValue::empty()),
            Field::new("Item Category", 30.0, |r| FieldValue::text(r.folder)),
            Field::new("Brand", 20.0, |_| FieldValue::empty()),
            Field::new("Country of Origin", 20.0, |_| FieldValue::text("CHINA")),
            Field::new("HS Code", 15.0, |_| FieldValue::empty()),
            Field::new("Customs Duty Rate", 20.0, |_| FieldValue::empty()),
            Field::new("Net Weight", 15.0, |_| FieldValue::empty()),
            Field::new("Use Serial Numbers?", 20.0, |_| FieldValue::empty()),
            Field::new("Use Batches?", 20.0, |_| FieldValue::empty()),
            Field::new("Use Characteristics?", 20.0, |_| FieldValue::empty()),
        ],
    )
}

/// 每条供应商明细一行; folder / Item Category 取自客户发票号
pub fn map_items(supplier: &InvoiceRecord, client: &InvoiceRecord) -> Result<Sheet, InvoiceError> {
    validate_items("Items", &supplier.items)?;
    let folder = client.folder();
    let sheet = items_projection().project(
        supplier
            .items
            .iter()
            .map(|item| ItemsRow { item, folder: &folder }),
    );
    Ok(sheet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn headers_are_in_import_order() {
        let sheet = map_items(&InvoiceRecord::default(), &InvoiceRecord::default()).unwrap();
        assert_eq!(
            sheet.headers(),
            vec![
                "item name",
                "folder",
                "sku",
                "uom",
                "Item Type",
                "Barcode",
                "Item Category",
                "Brand",
                "Country of Origin",
                "HS Code",
                "Customs Duty Rate",
                "Net Weight",
                "Use Serial Numbers?",
                "Use Batches?",
                "Use Characteristics?",
            ]
        );
        let widths: Vec<f64> = sheet.columns.iter().map(|c| c.width).collect();
        assert_eq!(
            widths,
            vec![40.0, 30.0, 20.0, 10.0, 20.0, 20.0, 30.0, 20.0, 20.0, 15.0, 20.0, 15.0, 20.0, 20.0, 20.0]
        );
        assert!(sheet.rows.is_empty());
    }

    #[test]
    fn one_row_per_supplier_item_with_client_folder() {
        let supplier = InvoiceRecord {
            invoice_number: "SUP-1".to_string(),
            items: vec![
                LineItem {
                    sku: "A1".to_string(),
                    description: "Brake pads Тормозные колодки".to_string(),
                    ..Default::default()
                },
                LineItem {
                    sku: "B2".to_string(),
                    description: "Oil filter".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let client = InvoiceRecord {
            invoice_number: "M04 ADR0301".to_string(),
            ..Default::default()
        };

        let sheet = map_items(&supplier, &client).unwrap();
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(
            sheet.value(0, "item name"),
            Some(&FieldValue::text("Brake pads Тормозные колодки"))
        );
        assert_eq!(sheet.value(0, "folder"), Some(&FieldValue::text("M04_ADR0301")));
        assert_eq!(sheet.value(1, "Item Category"), Some(&FieldValue::text("M04_ADR0301")));
        assert_eq!(sheet.value(1, "sku"), Some(&FieldValue::text("B2")));
        assert_eq!(sheet.value(1, "Item Type"), Some(&FieldValue::text("Inventory Item")));
        assert_eq!(sheet.value(1, "Country of Origin"), Some(&FieldValue::text("CHINA")));
        assert_eq!(sheet.value(1, "Brand"), Some(&FieldValue::empty()));
    }
}
