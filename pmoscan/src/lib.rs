//! # pmoscan - Découverte des photos pour PMOPhoto
//!
//! Surveille un répertoire et alimente le [`PlaybackScheduler`] avec chaque
//! nouvelle photo trouvée :
//! - Scan non récursif filtré par extension (insensible à la casse)
//! - Identité = chemin canonique ; un fichier déjà connu n'est jamais ré-ajouté
//! - Légende tirée du texte entre crochets dans le nom du fichier
//! - Rescan périodique en tâche tokio jusqu'à annulation
//!
//! # Exemple d'utilisation
//!
//! ```no_run
//! use pmoplaylist::PlaybackScheduler;
//! use pmoscan::DirectoryScanner;
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> pmoscan::Result<()> {
//! let playlist = Arc::new(PlaybackScheduler::new());
//! let scanner = Arc::new(DirectoryScanner::new("./photos", vec!["jpg".into()], playlist.clone()));
//!
//! // L'arriéré du démarrage part en rotation aléatoire
//! scanner.initial_scan()?;
//!
//! let stop = CancellationToken::new();
//! let watcher = scanner.watch(Duration::from_secs(2), stop.clone());
//!
//! // ...
//! stop.cancel();
//! watcher.await.ok();
//! # Ok(())
//! # }
//! ```
//!
//! [`PlaybackScheduler`]: pmoplaylist::PlaybackScheduler

mod caption;
mod error;
mod scanner;

pub use caption::caption_from_filename;
pub use error::{Result, ScanError};
pub use scanner::DirectoryScanner;
