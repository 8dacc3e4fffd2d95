pub mod game;
pub mod question;
pub use game::Game;
pub use question::{GameType, Question};
