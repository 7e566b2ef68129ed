//! Dynamic music: named, aliased tracks played in sync with tick-driven fades.

pub mod app;
pub mod assets;
pub mod cli;
pub mod error;
pub mod logging;
pub mod music;
pub mod settings;
pub mod worker;

pub use assets::{HandleId, Music, MusicLoader, NullLoader, RodioLoader};
pub use error::MusicError;
pub use music::DynamicMusic;
