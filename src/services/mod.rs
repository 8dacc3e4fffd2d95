pub mod blank_selector;
pub mod completion_provider;
pub mod extraction;
pub mod game_service;
pub mod grading_service;
pub mod question_generator;
pub mod translation_service;
