pub mod invoice;
pub mod report;
pub mod session;
pub mod tabular;

pub use invoice::{round_currency, InvoiceRecord, LineItem, CURRENCY_SCALE};
pub use report::{ReconciliationReport, RecordCheck, TotalsCheck};
pub use session::{Artifact, ArtifactKind, Session, SessionStage, Upload};
pub use tabular::{Cell, ColumnSpec, FieldValue, Grid, Sheet};
