//! Domain types shared by the data provider and the metrics pipeline.

pub mod symbol;
pub mod table;

pub use symbol::Symbol;
pub use table::PriceTable;
