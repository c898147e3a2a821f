// Route handlers, one module per API area. Public and signed-in handlers live
// side by side; signed-in handlers take an `Authenticated` extractor.
pub mod auth;
pub mod content;
pub mod dashboard;
pub mod inbox;
pub mod seo;
pub mod services;
pub mod system;

pub use dashboard::dashboard;
pub use seo::{robots, sitemap};
pub use system::{health, root};
