use pmoconfig::Config;
use pmoplaylist::{PlaybackScheduler, PlaylistEntry};
use pmoscan::{DirectoryScanner, ScanError};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn touch(dir: &Path, name: &str) {
    fs::write(dir.join(name), b"not really a jpeg").unwrap();
}

fn create_scanner(extensions: &[&str]) -> (TempDir, Arc<PlaybackScheduler>, Arc<DirectoryScanner>) {
    let temp_dir = tempfile::tempdir().unwrap();
    let playlist = Arc::new(PlaybackScheduler::new());
    let scanner = Arc::new(DirectoryScanner::new(
        temp_dir.path(),
        extensions.iter().map(|e| e.to_string()).collect(),
        playlist.clone(),
    ));
    (temp_dir, playlist, scanner)
}

fn drain_fresh(playlist: &PlaybackScheduler) -> Vec<PlaylistEntry> {
    let n = playlist.stats().fresh;
    (0..n).map(|_| playlist.pick_next().unwrap()).collect()
}

#[test]
fn test_scan_adds_matching_files_in_name_order() {
    let (dir, playlist, scanner) = create_scanner(&["jpg"]);
    touch(dir.path(), "b.jpg");
    touch(dir.path(), "[Mamie] a.JPG");
    touch(dir.path(), "notes.txt");
    fs::create_dir(dir.path().join("sub.jpg")).unwrap();

    assert_eq!(scanner.scan().unwrap(), 2);
    assert_eq!(scanner.known_count(), 2);

    let picked = drain_fresh(&playlist);
    let names: Vec<_> = picked
        .iter()
        .map(|e| e.path().file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["[Mamie] a.JPG", "b.jpg"]);
    assert_eq!(picked[0].caption(), "Mamie");
    assert_eq!(picked[1].caption(), "");
}

#[test]
fn test_entries_use_canonical_paths() {
    let (dir, playlist, scanner) = create_scanner(&["jpg"]);
    touch(dir.path(), "x.jpg");

    scanner.scan().unwrap();
    let entry = playlist.pick_next().unwrap();
    assert!(entry.path().is_absolute());
    assert_eq!(
        entry.path(),
        fs::canonicalize(dir.path().join("x.jpg")).unwrap()
    );
}

#[cfg(unix)]
#[test]
fn test_symlink_caption_comes_from_listed_name() {
    let (dir, playlist, scanner) = create_scanner(&["jpg"]);
    let elsewhere = tempfile::tempdir().unwrap();
    touch(elsewhere.path(), "IMG_0001.jpg");
    std::os::unix::fs::symlink(
        elsewhere.path().join("IMG_0001.jpg"),
        dir.path().join("[Bob] plage.jpg"),
    )
    .unwrap();

    assert_eq!(scanner.scan().unwrap(), 1);
    let entry = playlist.pick_next().unwrap();
    assert_eq!(entry.caption(), "Bob");
    // L'identité reste la cible canonique
    assert_eq!(
        entry.path(),
        fs::canonicalize(elsewhere.path().join("IMG_0001.jpg")).unwrap()
    );
}

#[test]
fn test_rescan_only_adds_new_files() {
    let (dir, playlist, scanner) = create_scanner(&["jpg", ".png"]);
    touch(dir.path(), "one.jpg");
    assert_eq!(scanner.scan().unwrap(), 1);
    assert_eq!(scanner.scan().unwrap(), 0);

    // Modifier un fichier connu ne le ré-ajoute pas
    touch(dir.path(), "one.jpg");
    touch(dir.path(), "two.png");
    assert_eq!(scanner.scan().unwrap(), 1);
    assert_eq!(playlist.len(), 2);
}

#[test]
fn test_initial_scan_promotes_backlog() {
    let (dir, playlist, scanner) = create_scanner(&["jpg"]);
    for name in ["a.jpg", "b.jpg", "c.jpg"] {
        touch(dir.path(), name);
    }

    assert_eq!(scanner.initial_scan().unwrap(), 3);
    let stats = playlist.stats();
    assert_eq!(stats.fresh, 0);
    assert_eq!(stats.pool, 3);

    // Un fichier arrivé après le démarrage passe en tête
    touch(dir.path(), "late.jpg");
    scanner.scan().unwrap();
    let next = playlist.pick_next().unwrap();
    assert_eq!(next.path().file_name().unwrap(), "late.jpg");
}

#[test]
fn test_missing_directory_is_an_error() {
    let (dir, playlist, _) = create_scanner(&["jpg"]);
    let scanner = DirectoryScanner::new(dir.path().join("absent"), vec!["jpg".into()], playlist.clone());

    assert!(matches!(scanner.scan(), Err(ScanError::NotADirectory(_))));
    assert!(playlist.is_empty());
}

#[test]
fn test_overlapping_scans_do_not_duplicate() {
    let (dir, playlist, scanner) = create_scanner(&["jpg"]);
    for i in 0..50 {
        touch(dir.path(), &format!("{i:03}.jpg"));
    }

    let added: usize = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4).map(|_| scope.spawn(|| scanner.scan().unwrap())).collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum()
    });

    assert_eq!(added, 50);
    assert_eq!(playlist.len(), 50);
}

#[test]
fn test_from_config() {
    let config_dir = tempfile::tempdir().unwrap();
    let config = Config::load_config(config_dir.path().to_str().unwrap()).unwrap();
    config.set_photo_extensions(&["JPEG"]).unwrap();

    let playlist = Arc::new(PlaybackScheduler::new());
    let scanner = DirectoryScanner::from_config(&config, playlist.clone()).unwrap();
    assert_eq!(scanner.directory(), config_dir.path().join("photos"));

    touch(scanner.directory(), "a.jpeg");
    touch(scanner.directory(), "b.jpg");
    assert_eq!(scanner.scan().unwrap(), 1);
}

#[tokio::test]
async fn test_watch_picks_up_new_files_until_cancelled() {
    let (dir, playlist, scanner) = create_scanner(&["jpg"]);
    scanner.initial_scan().unwrap();

    let signals = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let counter = signals.clone();
    playlist.on_first_fresh(move || {
        counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    });

    let stop = CancellationToken::new();
    let watcher = scanner.clone().watch(Duration::from_millis(20), stop.clone());

    touch(dir.path(), "new.jpg");
    tokio::time::timeout(Duration::from_secs(5), async {
        while playlist.len() < 1 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("watcher should find the new file");
    assert_eq!(signals.load(std::sync::atomic::Ordering::SeqCst), 1);

    stop.cancel();
    tokio::time::timeout(Duration::from_secs(5), watcher)
        .await
        .expect("watcher should stop")
        .unwrap();

    // Après annulation, plus rien n'est ajouté
    touch(dir.path(), "after.jpg");
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(playlist.len(), 1);
}
