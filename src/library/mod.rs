// Local song library

pub mod models;
pub mod store;

pub use models::Song;
pub use store::SongStore;
