pub use super::session::Entity as Session;
pub use super::todo::Entity as Todo;
pub use super::user::Entity as User;
