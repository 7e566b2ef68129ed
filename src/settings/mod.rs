pub mod store;

pub use store::{MusicSettings, default_data_dir, load_settings, save_settings, settings_path};
