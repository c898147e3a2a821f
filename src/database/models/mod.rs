mod content;
mod project;
mod service;
mod submission;
mod user;

pub use content::{BlogPost, PortfolioItem, TeamMember, Testimonial};
pub use project::ClientProject;
pub use service::{Service, ServiceItem, ServiceWithItems};
pub use submission::{CareerApplication, ContactSubmission};
pub use user::{Session, User};
