pub mod api;
pub mod calculator;
pub mod error;
pub mod models;
pub mod snapshot;
pub mod utils;

pub use error::{SheetError, SheetResult};
