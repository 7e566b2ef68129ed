/// 音乐线程端到端测试（无音频设备）
///
/// 覆盖场景：
/// 1. 加载、重命名、播放后能列出音轨状态
/// 2. 淡出在刷新循环中完成并发送 FadeFinished
/// 3. 出错的命令只返回 Error 事件，线程继续工作
use std::path::PathBuf;
use std::time::Duration;

use dynamic_music::settings::MusicSettings;
use dynamic_music::worker::{MusicBackend, MusicCommand, MusicEvent, Tracks, spawn_music_worker};
use tokio::sync::mpsc;

fn stems(dir: &tempfile::TempDir, names: &[&str]) -> Vec<PathBuf> {
    names
        .iter()
        .map(|n| {
            let p = dir.path().join(n);
            std::fs::write(&p, b"stem").expect("write stem");
            p
        })
        .collect()
}

async fn next(rx: &mut mpsc::Receiver<MusicEvent>) -> MusicEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("worker reply timed out")
        .expect("worker closed")
}

#[tokio::test]
async fn test_load_alias_play_and_list() {
    let dir = tempfile::tempdir().expect("tempdir");
    let paths = stems(&dir, &["drums.ogg", "bass.ogg"]);
    let (tx, mut rx) = spawn_music_worker(MusicBackend::Null, MusicSettings::default());

    tx.send(MusicCommand::Add { paths: paths.clone() }).await.expect("send");
    let MusicEvent::Added { tracks } = next(&mut rx).await else {
        panic!("expected Added");
    };
    assert_eq!(tracks.len(), 2);

    let drums = paths[0].to_string_lossy().into_owned();
    tx.send(MusicCommand::Rename {
        old: drums.clone(),
        new: "drums".to_owned(),
    })
    .await
    .expect("send");
    assert_eq!(
        next(&mut rx).await,
        MusicEvent::Renamed {
            old: drums.clone(),
            new: "drums".to_owned()
        }
    );

    tx.send(MusicCommand::Play {
        tracks: Tracks::named(["drums"]),
    })
    .await
    .expect("send");
    assert!(matches!(next(&mut rx).await, MusicEvent::Playing { .. }));

    tx.send(MusicCommand::ListTracks).await.expect("send");
    let MusicEvent::TrackList { tracks } = next(&mut rx).await else {
        panic!("expected TrackList");
    };
    assert_eq!(tracks.len(), 3);
    let alias = tracks.iter().find(|t| t.name == "drums").expect("alias");
    let original = tracks.iter().find(|t| t.name == drums).expect("original");
    assert_eq!(alias.handle, original.handle);
    assert!(alias.playing);
}

#[tokio::test]
async fn test_fade_out_finishes_on_tick() {
    let dir = tempfile::tempdir().expect("tempdir");
    let paths = stems(&dir, &["pad.ogg"]);
    let settings = MusicSettings {
        fade_tick_ms: 5,
        ..MusicSettings::default()
    };
    let (tx, mut rx) = spawn_music_worker(MusicBackend::Null, settings);

    tx.send(MusicCommand::Add { paths }).await.expect("send");
    assert!(matches!(next(&mut rx).await, MusicEvent::Added { .. }));
    tx.send(MusicCommand::Play { tracks: Tracks::All })
        .await
        .expect("send");
    assert!(matches!(next(&mut rx).await, MusicEvent::Playing { .. }));

    tx.send(MusicCommand::FadeOut {
        duration_ms: 30,
        volume: Some(0.1),
        tracks: Tracks::All,
    })
    .await
    .expect("send");
    assert!(matches!(
        next(&mut rx).await,
        MusicEvent::FadeStarted { duration_ms: 30, .. }
    ));
    assert!(matches!(next(&mut rx).await, MusicEvent::FadeFinished { .. }));

    tx.send(MusicCommand::ListTracks).await.expect("send");
    let MusicEvent::TrackList { tracks } = next(&mut rx).await else {
        panic!("expected TrackList");
    };
    assert!((tracks[0].volume - 0.1).abs() < 1e-6);
    assert!(!tracks[0].fading);
}

#[tokio::test]
async fn test_errors_do_not_stop_worker() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (tx, mut rx) = spawn_music_worker(MusicBackend::Null, MusicSettings::default());

    tx.send(MusicCommand::Add {
        paths: vec![dir.path().join("missing.ogg")],
    })
    .await
    .expect("send");
    assert!(matches!(next(&mut rx).await, MusicEvent::Error(_)));

    tx.send(MusicCommand::Stop {
        tracks: Tracks::named(["nobody"]),
    })
    .await
    .expect("send");
    let MusicEvent::Error(msg) = next(&mut rx).await else {
        panic!("expected Error");
    };
    assert!(msg.contains("nobody"));

    tx.send(MusicCommand::Remove { tracks: Tracks::All })
        .await
        .expect("send");
    assert_eq!(
        next(&mut rx).await,
        MusicEvent::Removed { tracks: vec![] }
    );
}
