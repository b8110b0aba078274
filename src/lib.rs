pub mod config;
pub mod db;
pub mod domain;
pub mod exercise;
pub mod game;
pub mod handlers;
pub mod practice;
pub mod services;
pub mod srs;
pub mod state;
pub mod validation;

#[cfg(test)]
pub mod testing;
