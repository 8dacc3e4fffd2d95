pub mod game_dto;
pub mod request;
pub mod response;
