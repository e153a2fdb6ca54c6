//! DirectoryScanner : producteur d'entrées pour le scheduler

use crate::caption::caption_from_filename;
use crate::error::{Result, ScanError};
use parking_lot::Mutex;
use pmoconfig::Config;
use pmoplaylist::{PlaybackScheduler, PlaylistEntry};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const MIN_RESCAN_INTERVAL: Duration = Duration::from_millis(100);

/// Scanne un répertoire et ajoute les nouvelles photos à la playlist
///
/// Les chemins déjà vus sont mémorisés (forme canonique) : un fichier n'est
/// ajouté qu'une seule fois, même s'il est modifié ensuite. Plusieurs scans
/// peuvent se chevaucher sans doublon.
pub struct DirectoryScanner {
    directory: PathBuf,
    extensions: Vec<String>,
    known: Mutex<BTreeSet<PathBuf>>,
    playlist: Arc<PlaybackScheduler<PlaylistEntry>>,
}

impl DirectoryScanner {
    /// Crée un scanner
    ///
    /// `extensions` : extensions acceptées, sans point ; la comparaison ignore
    /// la casse.
    pub fn new(
        directory: impl Into<PathBuf>,
        extensions: Vec<String>,
        playlist: Arc<PlaybackScheduler<PlaylistEntry>>,
    ) -> Self {
        let extensions = extensions
            .into_iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .collect();

        Self {
            directory: directory.into(),
            extensions,
            known: Mutex::new(BTreeSet::new()),
            playlist,
        }
    }

    /// Crée un scanner à partir de la section `scanner` de la configuration
    pub fn from_config(
        config: &Config,
        playlist: Arc<PlaybackScheduler<PlaylistEntry>>,
    ) -> Result<Self> {
        let directory = config.get_photo_dir()?;
        Ok(Self::new(directory, config.get_photo_extensions(), playlist))
    }

    /// Répertoire surveillé
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Nombre de fichiers déjà connus
    pub fn known_count(&self) -> usize {
        self.known.lock().len()
    }

    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| self.extensions.iter().any(|e| *e == ext))
    }

    /// Scanne le répertoire une fois
    ///
    /// Les nouveaux fichiers d'un même scan sont ajoutés dans l'ordre de leur
    /// chemin. Retourne le nombre d'entrées ajoutées.
    pub fn scan(&self) -> Result<usize> {
        if !self.directory.is_dir() {
            return Err(ScanError::NotADirectory(self.directory.clone()));
        }

        let entries = fs::read_dir(&self.directory).map_err(|source| ScanError::Io {
            path: self.directory.clone(),
            source,
        })?;

        let mut candidates = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| ScanError::Io {
                path: self.directory.clone(),
                source,
            })?;
            let path = entry.path();
            if !self.accepts(&path) || !path.is_file() {
                continue;
            }

            // Le fichier peut disparaître entre le listing et la canonicalisation
            match fs::canonicalize(&path) {
                Ok(canon) => candidates.push((path, canon)),
                Err(e) => debug!(path = %path.display(), error = %e, "Skipping vanished file"),
            }
        }
        candidates.sort();

        // Réserver les chemins sous le verrou : un scan concurrent ne les verra plus comme nouveaux
        let fresh: Vec<(PathBuf, PathBuf)> = {
            let mut known = self.known.lock();
            candidates
                .into_iter()
                .filter(|(_, canon)| known.insert(canon.clone()))
                .collect()
        };

        let count = fresh.len();
        for (listed, canon) in fresh {
            // La légende vient du nom listé, pas de la cible d'un lien symbolique
            let caption = caption_from_filename(&listed);
            info!(path = %canon.display(), caption = %caption, "New photo found");
            self.playlist.add(PlaylistEntry::new(canon, caption));
        }

        Ok(count)
    }

    /// Scan de démarrage : l'arriéré entre directement en rotation aléatoire
    pub fn initial_scan(&self) -> Result<usize> {
        let count = self.scan()?;
        self.playlist.promote_all_fresh_to_pool();
        info!(
            directory = %self.directory.display(),
            count,
            "Initial scan complete"
        );
        Ok(count)
    }

    /// Lance la surveillance périodique du répertoire
    ///
    /// Rescanne toutes les `interval` jusqu'à annulation de `stop`. Les erreurs
    /// de scan sont journalisées et n'interrompent pas la surveillance.
    pub fn watch(self: Arc<Self>, interval: Duration, stop: CancellationToken) -> JoinHandle<()> {
        let interval = interval.max(MIN_RESCAN_INTERVAL);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // Le premier tick est immédiat : le scan initial a déjà eu lieu
            ticker.tick().await;

            info!(
                directory = %self.directory.display(),
                interval_ms = interval.as_millis() as u64,
                "Watching photo directory"
            );

            loop {
                tokio::select! {
                    _ = stop.cancelled() => break,
                    _ = ticker.tick() => {
                        let scanner = self.clone();
                        match tokio::task::spawn_blocking(move || scanner.scan()).await {
                            Ok(Ok(0)) => {}
                            Ok(Ok(count)) => debug!(count, "Rescan added photos"),
                            Ok(Err(e)) => warn!(error = %e, "Rescan failed"),
                            Err(e) => warn!(error = %e, "Rescan task panicked"),
                        }
                    }
                }
            }

            debug!(directory = %self.directory.display(), "Directory watcher stopped");
        })
    }
}
