use crate::error::InvoiceError;
use crate::llm::CompletionModel;
use crate::models::{InvoiceRecord, LineItem};
use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;
use std::sync::Arc;

/// 提取模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// 通用发票 prompt
    Generic,
    /// 供应商发票 prompt: SKU 列识别 / 描述拼接 / 日期选择规则
    Supplier,
}

const INVOICE_SCHEMA: &str = r#"{
  "invoice_number": string,
  "invoice_date": string,
  "buyer": string,
  "seller": string,
  "payment_term": string,
  "packing": string,
  "items": [
    {
      "sku": string,
      "description": string,
      "quantity": number,
      "unit_price": number,
      "total": number
    }
  ],
  "total_quantity": number,
  "total_amount": number
}"#;

const SUPPLIER_SCHEMA: &str = r#"{
  "invoice_number": string,   // from the "Invoice No." field
  "invoice_date": string,     // see the date rule below
  "contract": string,         // value of the "Contract" field, if present
  "buyer": string,            // who the invoice is billed to
  "seller": string,           // who issued the invoice
  "items": [
    {
      "sku": string,          // article / part number
      "description": string,  // full description (English and Russian parts, if any)
      "quantity": number,
      "unit_price": number,   // FCA or FOB price per unit, USD
      "total": number         // line total, USD
    }
  ],
  "total_quantity": number,
  "total_amount": number
}"#;

/// 渲染提取 prompt
pub fn render_prompt(table: &str, mode: ExtractionMode) -> String {
    match mode {
        ExtractionMode::Generic => format!(
            "You are an expert in the structure of commercial invoices.\n\
             Answer with valid JSON only, using this schema:\n{}\n\
             Here is the tabular invoice data:\n{}\n",
            INVOICE_SCHEMA, table
        ),
        ExtractionMode::Supplier => format!(
            "You extract structured data from supplier commercial invoices.\n\
             \n\
             Your task:\n\
             1. Find the column that holds the unique article number of each item (SKU). \
             It is usually labelled \"Part No\", \"Fenox No\", \"Код\", \"Артикул\" or similar.\n\
             2. Build JSON with this schema:\n{}\n\
             \n\
             Rules:\n\
             - Choose the \"sku\" column by meaning; the header may be \"Fenox No.\", \"Part No.\" and so on.\n\
             - If the description is split across several columns, join them \
             (for example: \"Brake pads Тормозные колодки барабанные\").\n\
             - Remove currency symbols ($, €, ₽), spaces and thousands separators from numbers.\n\
             - If the document contains several dates, use the one that immediately follows \
             the invoice number (Invoice No.), not simply the first or the last date.\n\
             - Example:\n\
             \x20 Invoice No.   M04 ADR0301\n\
             \x20 Date:         3/18/25\n\
             \x20 Contract:     2B20082024\n\
             \x20 Date:         8/20/24\n\
             \x20 In this case invoice_date = 3/18/25\n\
             - Return only valid JSON, without any comments.\n\
             \n\
             Here is the table:\n{}\n",
            SUPPLIER_SCHEMA, table
        ),
    }
}

/// 发票提取器: 一次模型调用 + 结构规范化, 不做内部重试
pub struct InvoiceExtractor {
    model: Arc<dyn CompletionModel>,
}

impl InvoiceExtractor {
    pub fn new(model: Arc<dyn CompletionModel>) -> Self {
        Self { model }
    }

    pub async fn extract(
        &self,
        table: &str,
        mode: ExtractionMode,
    ) -> Result<InvoiceRecord, InvoiceError> {
        let prompt = render_prompt(table, mode);
        let raw = self
            .model
            .complete(&prompt)
            .await
            .map_err(|e| InvoiceError::Extraction {
                reason: e.to_string(),
                raw: None,
            })?;

        let record = parse_invoice(&raw)?;
        tracing::info!(
            "Extracted invoice {} ({:?}): {} items",
            record.invoice_number,
            mode,
            record.items.len()
        );
        Ok(record)
    }
}

/// 解析模型输出, 缺失字段取默认值
pub fn parse_invoice(raw: &str) -> Result<InvoiceRecord, InvoiceError> {
    let value = parse_json_object(raw)?;
    let obj = match &value {
        Value::Object(obj) => obj,
        _ => return Err(schema_error("expected a JSON object", raw)),
    };
    let fields = Fields { obj, raw };

    let items = match lookup(obj, &["items", "line_items", "lineItems"]) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(list)) => list
            .iter()
            .enumerate()
            .map(|(idx, v)| parse_item(idx, v, raw))
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err(schema_error("\"items\" must be an array", raw)),
    };

    Ok(InvoiceRecord {
        invoice_number: fields.string(&["invoice_number", "invoiceNumber", "invoice_no"])?,
        invoice_date: fields.string(&["invoice_date", "invoiceDate", "date"])?,
        buyer: fields.string(&["buyer"])?,
        seller: fields.string(&["seller"])?,
        payment_term: fields.optional_string(&["payment_term", "paymentTerm"])?,
        packing: fields.optional_string(&["packing"])?,
        contract: fields.optional_string(&["contract"])?,
        items,
        total_quantity: fields.decimal(&["total_quantity", "totalQuantity"])?,
        total_amount: fields.decimal(&["total_amount", "totalAmount"])?,
    })
}

fn parse_item(idx: usize, value: &Value, raw: &str) -> Result<LineItem, InvoiceError> {
    let obj = match value {
        Value::Object(obj) => obj,
        _ => {
            return Err(schema_error(
                &format!("items[{}] must be an object", idx),
                raw,
            ))
        }
    };
    let fields = Fields { obj, raw };
    Ok(LineItem {
        sku: fields.string(&["sku"])?,
        description: fields.string(&["description"])?,
        quantity: fields.decimal(&["quantity"])?,
        unit_price: fields.decimal(&["unit_price", "unitPrice", "price"])?,
        total: fields.decimal(&["total"])?,
    })
}

/// 去掉 markdown 代码块; 仍失败时截取第一个 '{' 到最后一个 '}'
fn parse_json_object(raw: &str) -> Result<Value, InvoiceError> {
    let text = strip_code_fence(raw);
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Ok(value);
    }
    let sliced = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    };
    serde_json::from_str::<Value>(sliced).map_err(|e| schema_error(&e.to_string(), raw))
}

fn strip_code_fence(raw: &str) -> &str {
    let text = raw.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest
        .strip_prefix("json")
        .or_else(|| rest.strip_prefix("JSON"))
        .unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn schema_error(reason: &str, raw: &str) -> InvoiceError {
    InvoiceError::SchemaParse {
        reason: reason.to_string(),
        raw: raw.to_string(),
    }
}

fn lookup<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k))
}

struct Fields<'a> {
    obj: &'a Map<String, Value>,
    raw: &'a str,
}

impl Fields<'_> {
    fn string(&self, keys: &[&str]) -> Result<String, InvoiceError> {
        Ok(self.optional_string(keys)?.unwrap_or_default())
    }

    fn optional_string(&self, keys: &[&str]) -> Result<Option<String>, InvoiceError> {
        let text = match lookup(self.obj, keys) {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            Some(_) => {
                return Err(schema_error(
                    &format!("\"{}\" must be a string", keys[0]),
                    self.raw,
                ))
            }
        };
        Ok(Some(text).filter(|s| !s.is_empty()))
    }

    fn decimal(&self, keys: &[&str]) -> Result<BigDecimal, InvoiceError> {
        let invalid = || {
            schema_error(
                &format!("\"{}\" must be a number", keys[0]),
                self.raw,
            )
        };
        match lookup(self.obj, keys) {
            None | Some(Value::Null) => Ok(BigDecimal::zero()),
            Some(Value::Number(n)) => BigDecimal::from_str(&n.to_string()).map_err(|_| invalid()),
            Some(Value::String(s)) => parse_amount(s).ok_or_else(invalid),
            Some(_) => Err(invalid()),
        }
    }
}

/// 解析带货币符号/千分位的数字文本, 空文本为 0
pub fn parse_amount(text: &str) -> Option<BigDecimal> {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, ',' | '\'' | '$' | '€' | '₽' | '£' | '¥'))
        .collect();
    if cleaned.is_empty() {
        return Some(BigDecimal::zero());
    }
    BigDecimal::from_str(&cleaned).ok()
}
