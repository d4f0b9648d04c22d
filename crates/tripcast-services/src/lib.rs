#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod favorites;

pub use favorites::{Favorites, FavoritesClient, FavoritesError};
