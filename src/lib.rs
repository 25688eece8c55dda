pub mod chat;
pub mod cli;
pub mod client;
pub mod config;
pub mod documentation;
pub mod questionnaire;
pub mod report;
pub mod session;
pub mod wizard;
