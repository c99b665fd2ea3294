pub mod account;
pub mod user;

pub use account::AccountService;
pub use user::UserService;
