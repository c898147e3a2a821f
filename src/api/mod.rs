pub mod pagination;
pub mod validate;

pub use pagination::{Page, PageQuery};
pub use validate::{as_integer, normalize_email, parse_flag, parse_id, validate_date, validate_slug, validate_timestamp, Payload};
