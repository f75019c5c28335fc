mod auth_dto;

pub use auth_dto::{
    ChangePasswordRequestDto, LoginRequestDto, MessageResponseDto, RegisterRequestDto,
};
