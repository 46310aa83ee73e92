pub mod pdf;
pub mod project;
pub mod user;

pub use pdf::Pdf;
pub use project::{default_project_data, Project, ProjectWithPdfs};
pub use user::User;
