pub mod game_handler;
pub mod graphql_handler;
pub mod health_handler;
pub mod question_handler;

pub use game_handler::{create_game, end_game, game_statistics, get_game, player_statistics};
pub use health_handler::{health_check, health_check_live, health_check_ready};
pub use question_handler::check_answer;
