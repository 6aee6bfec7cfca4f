use super::{optional_number, total_amount, validate_items, vat_amount, Field, Projection};
use crate::error::InvoiceError;
use crate::models::{FieldValue, InvoiceRecord, LineItem, Sheet};
use crate::service::normalize_description;

/// Inv (入库) 表的一行
pub struct InvRow<'a> {
    pub supplier: &'a InvoiceRecord,
    pub item: &'a LineItem,
    /// 已规范化的供应商发票日期
    pub date: &'a str,
}

pub fn inv_projection<'a>() -> Projection<InvRow<'a>> {
    Projection::new(
        "Inv",
        vec![
            Field::text("Date", 15.0, |r| FieldValue::text(r.date)),
            Field::text("Invoice Number", 20.0, |r| {
                FieldValue::text(r.supplier.invoice_number.as_str())
            }),
            Field::new("Supplier Name", 30.0, |r| FieldValue::text(r.supplier.seller.as_str())),
            Field::new("Warehouse", 15.0, |_| FieldValue::empty()),
            Field::new("Item", 20.0, |r| FieldValue::text(r.item.sku.as_str())),
            Field::new("Content", 40.0, |r| {
                FieldValue::Text(normalize_description(&r.item.description))
            }),
            Field::new("Document Currency", 10.0, |_| FieldValue::text("USD")),
            Field::new("Quantity", 10.0, |r| optional_number(&r.item.quantity)),
            Field::new("UOM", 10.0, |_| FieldValue::empty()),
            Field::new("Price", 10.0, |r| optional_number(&r.item.unit_price)),
            Field::new("Inclusive of VAT", 15.0, |_| FieldValue::text("No")),
            Field::new("VAT, %", 15.0, |_| FieldValue::text("Out of Scope")),
            Field::new("VAT Amount", 15.0, |_| vat_amount()),
            Field::new("Total Amount", 15.0, |r| total_amount(r.item)),
            Field::new("Import", 10.0, |_| FieldValue::empty()),
            Field::new("Inventory.GLAccount_GL", 20.0, |_| FieldValue::text("Goods")),
        ],
    )
}

/// 每条供应商明细一行; `date` 为日期规范化的结果
pub fn map_inv(
    supplier: &InvoiceRecord,
    _client: &InvoiceRecord,
    date: &str,
) -> Result<Sheet, InvoiceError> {
    validate_items("Inv", &supplier.items)?;
    let sheet = inv_projection().project(
        supplier
            .items
            .iter()
            .map(|item| InvRow { supplier, item, date }),
    );
    Ok(sheet)
}
