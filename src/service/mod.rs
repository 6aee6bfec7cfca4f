pub mod date_normalizer;
pub mod description;
pub mod extractor;
pub mod flattener;
pub mod mapper;
pub mod pipeline;
pub mod reconciler;

pub use date_normalizer::{format_known_date, is_canonical_date, DateNormalizer};
pub use description::normalize_description;
pub use extractor::{parse_invoice, ExtractionMode, InvoiceExtractor};
pub use flattener::{flatten, FlattenFormat};
pub use mapper::{map_inv, map_items, map_sales, Field, Projection};
pub use pipeline::{InvoicePipeline, PipelineOutput};
pub use reconciler::{calculate_totals, reconcile, CalculatedTotals};
