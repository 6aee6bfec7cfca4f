pub mod reader;
pub mod writer;

pub use reader::load;
pub use writer::{write_csv, write_xlsx};
