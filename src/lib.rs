pub mod admin;
pub mod auth;
pub mod config;
pub mod docs;
pub mod feed;
pub mod logging;
pub mod models;
pub mod objects;
pub mod prefs;
#[cfg(test)]
mod test_utils;
