//! Boucle du diaporama : une photo toutes les `interval`, ou tout de suite
//! quand une photo fraîche arrive après une période sèche.

use pmoconfig::Config;
use pmoplaylist::{PlaybackScheduler, PlaylistEntry};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const MIN_PHOTO_INTERVAL: Duration = Duration::from_millis(100);

/// Destination des photos sélectionnées
///
/// Le rendu (décodage, animation, légende à l'écran) est entièrement à la
/// charge de l'implémentation ; le diaporama ne fait que lui passer l'entrée.
pub trait PhotoSink: Send + Sync {
    fn show(&self, entry: &PlaylistEntry);
}

impl<T: PhotoSink + ?Sized> PhotoSink for Arc<T> {
    fn show(&self, entry: &PlaylistEntry) {
        (**self).show(entry)
    }
}

/// Sink qui se contente de journaliser la photo affichée
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl PhotoSink for TracingSink {
    fn show(&self, entry: &PlaylistEntry) {
        info!(
            path = %entry.path().display(),
            caption = %entry.caption(),
            "🖼️ Showing photo"
        );
    }
}

/// Consommateur cadencé de la playlist
pub struct Slideshow<S> {
    playlist: Arc<PlaybackScheduler>,
    sink: S,
    first_delay: Duration,
    interval: Duration,
}

impl<S: PhotoSink> Slideshow<S> {
    pub fn new(
        playlist: Arc<PlaybackScheduler>,
        sink: S,
        first_delay: Duration,
        interval: Duration,
    ) -> Self {
        Self {
            playlist,
            sink,
            first_delay,
            interval: interval.max(MIN_PHOTO_INTERVAL),
        }
    }

    /// Cadence lue dans la section `slideshow` de la configuration
    pub fn from_config(config: &Config, playlist: Arc<PlaybackScheduler>, sink: S) -> Self {
        Self::new(
            playlist,
            sink,
            config.get_first_photo_delay(),
            config.get_photo_interval(),
        )
    }

    /// Tourne jusqu'à annulation de `stop` et retourne le nombre de photos montrées
    ///
    /// Une photo fraîche arrivant après une série de tirages « anciens » est
    /// montrée immédiatement, et la cadence repart de ce moment.
    pub async fn run(&self, stop: CancellationToken) -> usize {
        let wake = Arc::new(Notify::new());
        let waker = wake.clone();
        let token = self.playlist.on_first_fresh(move || waker.notify_one());

        info!(
            first_delay_ms = self.first_delay.as_millis() as u64,
            interval_ms = self.interval.as_millis() as u64,
            "Slideshow started"
        );

        let mut deadline = Instant::now() + self.first_delay;
        let mut shown = 0;

        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                _ = tokio::time::sleep_until(deadline) => {}
                _ = wake.notified() => debug!("Fresh photo after a dry spell, showing it now"),
            }

            if self.show_next() {
                shown += 1;
            }
            deadline = Instant::now() + self.interval;
        }

        self.playlist.remove_listener(token);
        info!(shown, "Slideshow stopped");
        shown
    }

    fn show_next(&self) -> bool {
        match self.playlist.pick_next_with_source() {
            Some((entry, source)) => {
                debug!(source = %source, path = %entry.path().display(), "Next photo picked");
                self.sink.show(&entry);
                true
            }
            None => {
                debug!("Nothing to show yet");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        shown: Mutex<Vec<PlaylistEntry>>,
    }

    impl RecordingSink {
        fn captions(&self) -> Vec<String> {
            self.shown
                .lock()
                .iter()
                .map(|e| e.caption().to_string())
                .collect()
        }
    }

    impl PhotoSink for RecordingSink {
        fn show(&self, entry: &PlaylistEntry) {
            self.shown.lock().push(entry.clone());
        }
    }

    fn entry(name: &str) -> PlaylistEntry {
        PlaylistEntry::new(format!("/photos/{name}.jpg"), name)
    }

    fn start(
        playlist: &Arc<PlaybackScheduler>,
        sink: &Arc<RecordingSink>,
    ) -> (CancellationToken, tokio::task::JoinHandle<usize>) {
        let slideshow = Slideshow::new(
            playlist.clone(),
            sink.clone(),
            Duration::from_secs(1),
            Duration::from_secs(20),
        );
        let stop = CancellationToken::new();
        let task_stop = stop.clone();
        let handle = tokio::spawn(async move { slideshow.run(task_stop).await });
        (stop, handle)
    }

    #[tokio::test(start_paused = true)]
    async fn test_follows_the_cadence() {
        let playlist = Arc::new(PlaybackScheduler::new());
        playlist.add(entry("a"));
        playlist.add(entry("b"));
        playlist.promote_all_fresh_to_pool();

        let sink = Arc::new(RecordingSink::default());
        let (stop, handle) = start(&playlist, &sink);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(sink.captions().is_empty());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(sink.captions().len(), 1);

        tokio::time::sleep(Duration::from_secs(20)).await;
        let mut captions = sink.captions();
        captions.sort();
        assert_eq!(captions, vec!["a", "b"]);

        stop.cancel();
        assert_eq!(handle.await.unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_photo_is_shown_immediately() {
        let playlist = Arc::new(PlaybackScheduler::new());
        let sink = Arc::new(RecordingSink::default());
        let (stop, handle) = start(&playlist, &sink);

        // Premier tick à vide : rien à montrer
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(sink.captions().is_empty());

        playlist.add(entry("nouvelle"));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(sink.captions(), vec!["nouvelle"]);

        // La cadence repart de l'affichage immédiat
        tokio::time::sleep(Duration::from_secs(19)).await;
        assert_eq!(sink.captions().len(), 1);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(sink.captions(), vec!["nouvelle", "nouvelle"]);

        stop.cancel();
        assert_eq!(handle.await.unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_listener_removed_after_stop() {
        let playlist = Arc::new(PlaybackScheduler::new());
        let sink = Arc::new(RecordingSink::default());
        let (stop, handle) = start(&playlist, &sink);

        tokio::time::sleep(Duration::from_millis(10)).await;
        stop.cancel();
        assert_eq!(handle.await.unwrap(), 0);

        // Plus aucun consommateur : l'ajout ne déclenche aucun affichage
        playlist.add(entry("tardive"));
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(sink.captions().is_empty());
        assert_eq!(playlist.stats().fresh, 1);
    }
}
