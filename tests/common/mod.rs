#![allow(dead_code)]

use invoice_recon_rust::llm::ScriptedModel;
use rust_xlsxwriter::Workbook;

pub const SUPPLIER_MARK: &str = "SUPPLIER-INVOICE-SHEET";
pub const CLIENT_MARK: &str = "CLIENT-INVOICE-SHEET";

pub const SUPPLIER_JSON: &str = r#"{
  "invoice_number": "M04 ADR0301",
  "invoice_date": "2025-03-18",
  "buyer": "Gulf Auto Parts FZE",
  "seller": "Fenox Global",
  "items": [
    {"sku": "A", "description": "Brake Pad", "quantity": 5, "unit_price": 2, "total": 10}
  ],
  "total_quantity": 5,
  "total_amount": 10
}"#;

pub const CLIENT_JSON: &str = r#"```json
{
  "invoice_number": "C 17",
  "invoice_date": "2025-03-20",
  "buyer": "Dubai Motors LLC",
  "seller": "Gulf Auto Parts FZE",
  "items": [
    {"sku": "A", "description": "Колодки тормозные", "quantity": 5, "unit_price": 2, "total": 10}
  ],
  "total_quantity": 5,
  "total_amount": 10
}
```"#;

/// 单表工作簿, 每个字符串写入一个单元格
pub fn workbook(rows: &[&[&str]]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            sheet
                .write_string(r as u32, c as u16, *value)
                .expect("write cell");
        }
    }
    workbook.save_to_buffer().expect("save workbook")
}

pub fn supplier_workbook() -> Vec<u8> {
    workbook(&[
        &[SUPPLIER_MARK],
        &["Invoice No.", "M04 ADR0301"],
        &["Part No", "Description", "Qty", "Price", "Amount"],
        &["A", "Brake Pad", "5", "2", "10"],
    ])
}

pub fn client_workbook() -> Vec<u8> {
    workbook(&[
        &[CLIENT_MARK],
        &["Код", "Наименование", "Кол-во", "Цена", "Сумма"],
        &["A", "Колодки тормозные", "5", "2", "10"],
    ])
}

/// 离线模型: 日期规则在前, 避免与发票表格标记冲突
pub fn scripted_model() -> ScriptedModel {
    ScriptedModel::new()
        .reply("You are a date converter", "18/03/2025")
        .reply(SUPPLIER_MARK, SUPPLIER_JSON)
        .reply(CLIENT_MARK, CLIENT_JSON)
}
