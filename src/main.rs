use clap::Parser;
use dynamic_music::app::{PlayOptions, Session, run_play, run_shell};
use dynamic_music::cli::{Cli, Command};
use dynamic_music::error::AppError;
use dynamic_music::logging;
use dynamic_music::settings::{self, MusicSettings};
use dynamic_music::worker::{MusicBackend, spawn_music_worker};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    let data_dir = cli.data_dir.clone().unwrap_or_else(settings::default_data_dir);
    let _log_guard = logging::init(
        &data_dir,
        logging::LogConfig {
            dir: cli.log_dir.clone(),
            filter: cli.log_filter.clone(),
        },
    );
    tracing::info!(data_dir = %data_dir.display(), "dynamic-music 启动");

    let settings = settings::load_settings(&data_dir);
    let backend = if cli.no_audio {
        MusicBackend::Null
    } else {
        MusicBackend::Rodio
    };

    match cli.command {
        Command::Settings { save } => print_settings(&data_dir, &settings, save),
        Command::Play {
            files,
            volume,
            fade_in_ms,
            fade_out_ms,
            seconds,
        } => {
            let opts = PlayOptions {
                files,
                volume,
                fade_in_ms: fade_in_ms.unwrap_or(settings.default_fade_ms),
                fade_out_ms: fade_out_ms.unwrap_or(settings.default_fade_ms),
                seconds,
            };
            tracing::info!(?backend, files = opts.files.len(), "启动模式: play");
            let (tx, rx) = spawn_music_worker(backend, settings);
            run_play(Session::new(tx, rx), opts).await
        }
        Command::Shell { files } => {
            tracing::info!(?backend, "启动模式: shell");
            let (tx, rx) = spawn_music_worker(backend, settings);
            run_shell(Session::new(tx, rx), files).await
        }
    }
}

fn print_settings(
    data_dir: &std::path::Path,
    settings: &MusicSettings,
    save: bool,
) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(settings)?);
    if save {
        settings::save_settings(data_dir, settings)?;
        println!("saved to {}", settings::settings_path(data_dir).display());
    }
    Ok(())
}
