pub mod game_repository;

pub use game_repository::{GameRepository, MongoGameRepository};
