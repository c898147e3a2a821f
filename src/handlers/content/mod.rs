pub mod blog;
pub mod portfolio;
pub mod team;
pub mod testimonials;

// Re-export handler functions for use in routing
pub use blog::get as blog_get;
pub use blog::list as blog_list;
pub use blog::post as blog_post;
pub use portfolio::list as portfolio_list;
pub use portfolio::post as portfolio_post;
pub use team::list as team_list;
pub use team::post as team_post;
pub use testimonials::list as testimonials_list;
pub use testimonials::post as testimonials_post;

#[cfg(test)]
mod tests;
