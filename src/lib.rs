//! Video gallery server: category listing, like counts, ranked gallery pages
//! and a single-video player.

pub mod catalog;
pub mod config;
pub mod gallery;
pub mod likes;
pub mod natural;
pub mod player;
pub mod web;
