pub mod chatbot;
pub mod classifier;
pub mod config;
pub mod inference;
pub mod manager;
pub mod weather;
