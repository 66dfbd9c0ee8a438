pub mod game;
pub mod user;

pub use game::{
    parse_rating, Game, GameCreate, GameResponse, GameUpdate, GeoPoint, Review, ReviewCreate,
    ReviewResponse, ReviewUpdate,
};
pub use user::{RevokedToken, User};
