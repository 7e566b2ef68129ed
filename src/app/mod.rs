//! Drivers for the binary: a timed layered playback and an interactive shell,
//! both talking to the music worker over its channels.

pub mod parsers;

use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::select;
use tokio::sync::mpsc;

use crate::error::AppError;
use crate::worker::{MusicCommand, MusicEvent, TrackStatus, Tracks};

pub use parsers::{HELP, parse_command};

#[derive(Debug, Clone)]
pub struct PlayOptions {
    pub files: Vec<PathBuf>,
    pub volume: Option<f32>,
    pub fade_in_ms: u64,
    pub fade_out_ms: u64,
    /// `None` plays until Ctrl-C.
    pub seconds: Option<u64>,
}

/// Client side of the worker channels.
pub struct Session {
    tx: mpsc::Sender<MusicCommand>,
    rx: mpsc::Receiver<MusicEvent>,
}

impl Session {
    pub fn new(tx: mpsc::Sender<MusicCommand>, rx: mpsc::Receiver<MusicEvent>) -> Self {
        Self { tx, rx }
    }

    /// Sends a command and waits for its reply. `FadeFinished` events that
    /// arrive in between are logged and skipped.
    pub async fn request(&mut self, cmd: MusicCommand) -> Result<MusicEvent, AppError> {
        self.tx
            .send(cmd)
            .await
            .map_err(|_| AppError::Other("音乐线程已退出".to_owned()))?;
        loop {
            match self.rx.recv().await {
                Some(MusicEvent::FadeFinished { tracks }) => {
                    tracing::debug!(?tracks, "fade finished");
                }
                Some(MusicEvent::Error(e)) => return Err(AppError::Other(e)),
                Some(evt) => return Ok(evt),
                None => return Err(AppError::Other("音乐线程已退出".to_owned())),
            }
        }
    }

    /// Waits until `count` fades finished or `timeout` elapsed.
    async fn wait_fades(&mut self, mut count: usize, timeout: Duration) {
        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);
        while count > 0 {
            select! {
                _ = &mut deadline => {
                    tracing::debug!(remaining = count, "fade wait timed out");
                    return;
                }
                evt = self.rx.recv() => match evt {
                    Some(MusicEvent::FadeFinished { .. }) => count -= 1,
                    Some(other) => tracing::debug!(?other, "event while waiting for fades"),
                    None => return,
                }
            }
        }
    }
}

pub async fn run_play(mut session: Session, opts: PlayOptions) -> Result<(), AppError> {
    let tracks = start_layers(&mut session, &opts).await?;
    tracing::info!(?tracks, "layers loaded");
    println!("loaded {} track(s)", tracks.len());

    let run_for = opts.seconds.map(Duration::from_secs);
    let timer = tokio::time::sleep(run_for.unwrap_or(Duration::MAX));
    tokio::pin!(timer);
    loop {
        select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("收到 Ctrl-C");
                break;
            }
            _ = &mut timer, if run_for.is_some() => break,
            evt = session.rx.recv() => match evt {
                Some(MusicEvent::Error(e)) => return Err(AppError::Other(e)),
                Some(evt) => tracing::debug!(?evt, "event"),
                None => return Err(AppError::Other("音乐线程已退出".to_owned())),
            }
        }
    }

    if opts.fade_out_ms > 0 {
        let handles = list_tracks(&mut session).await?;
        let distinct = distinct_handles(&handles);
        session
            .request(MusicCommand::FadeOut {
                duration_ms: opts.fade_out_ms,
                volume: None,
                tracks: Tracks::All,
            })
            .await?;
        let grace = Duration::from_millis(opts.fade_out_ms.saturating_add(500));
        session.wait_fades(distinct, grace).await;
    }
    session.request(MusicCommand::Stop { tracks: Tracks::All }).await?;
    Ok(())
}

/// Loads the stems and starts them together. The fade-in is scheduled before
/// `Play` so the tracks start silent.
async fn start_layers(session: &mut Session, opts: &PlayOptions) -> Result<Vec<String>, AppError> {
    let MusicEvent::Added { tracks } = session
        .request(MusicCommand::Add {
            paths: opts.files.clone(),
        })
        .await?
    else {
        return Err(AppError::Other("unexpected reply to add".to_owned()));
    };

    if let Some(volume) = opts.volume {
        session
            .request(MusicCommand::SetVolume {
                volume,
                tracks: Tracks::All,
            })
            .await?;
    }
    if opts.fade_in_ms > 0 {
        session
            .request(MusicCommand::FadeIn {
                duration_ms: opts.fade_in_ms,
                volume: opts.volume,
                tracks: Tracks::All,
            })
            .await?;
    }
    session.request(MusicCommand::Play { tracks: Tracks::All }).await?;
    Ok(tracks)
}

pub async fn run_shell(mut session: Session, files: Vec<PathBuf>) -> Result<(), AppError> {
    if !files.is_empty() {
        let evt = session.request(MusicCommand::Add { paths: files }).await?;
        print_event(&evt);
    }

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let line = line.trim();
                match line {
                    "" => continue,
                    "quit" | "exit" => break,
                    "help" => {
                        println!("{HELP}");
                        continue;
                    }
                    _ => {}
                }
                match parse_command(line) {
                    Ok(cmd) => {
                        if session.tx.send(cmd).await.is_err() {
                            return Err(AppError::Other("音乐线程已退出".to_owned()));
                        }
                    }
                    Err(e) => eprintln!("{e}"),
                }
            }
            evt = session.rx.recv() => match evt {
                Some(evt) => print_event(&evt),
                None => return Err(AppError::Other("音乐线程已退出".to_owned())),
            }
        }
    }
    Ok(())
}

async fn list_tracks(session: &mut Session) -> Result<Vec<TrackStatus>, AppError> {
    match session.request(MusicCommand::ListTracks).await? {
        MusicEvent::TrackList { tracks } => Ok(tracks),
        other => Err(AppError::Other(format!("unexpected reply: {other:?}"))),
    }
}

fn distinct_handles(tracks: &[TrackStatus]) -> usize {
    let mut handles: Vec<u64> = tracks.iter().map(|t| t.handle).collect();
    handles.sort_unstable();
    handles.dedup();
    handles.len()
}

fn print_event(evt: &MusicEvent) {
    match evt {
        MusicEvent::TrackList { tracks } => {
            if tracks.is_empty() {
                println!("(no tracks)");
            }
            for t in tracks {
                println!(
                    "{:<32} #{:<3} vol={:.2} {}{} @{}ms",
                    t.name,
                    t.handle,
                    t.volume,
                    if t.playing { "playing" } else { "idle" },
                    if t.fading { " fading" } else { "" },
                    t.position_ms
                );
            }
        }
        MusicEvent::Error(e) => eprintln!("error: {e}"),
        other => println!("{other:?}"),
    }
}
