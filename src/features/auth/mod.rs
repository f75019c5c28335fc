pub mod dtos;
pub mod models;
pub mod services;

pub use dtos::{ChangePasswordRequestDto, LoginRequestDto, RegisterRequestDto};
pub use models::{User, UserStats};
pub use services::AuthService;
