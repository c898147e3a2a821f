pub mod types;
pub mod filter;
pub mod filter_where;
pub mod filter_order;
pub mod error;

pub use types::*;
pub use filter::{fold_search, is_identifier, Filter};
pub use error::FilterError;
