//! # pmoplaylist - Rotation de photos « fraîches d'abord, recyclage équitable »
//!
//! Cette crate fournit le moteur de sélection du diaporama :
//! - Les nouvelles entrées sont montrées rapidement, dans leur ordre d'arrivée
//! - Les entrées déjà vues sont recyclées équitablement : aucune n'est répétée
//!   tant que toutes les autres n'ont pas eu leur tour
//! - L'ordre entre les anciennes entrées est tiré au hasard
//! - Les ajouts peuvent arriver à tout moment, en concurrence avec les sélections
//!
//! # Architecture
//!
//! - **PlaybackScheduler** : possède la file fraîche, le pool aléatoire et le
//!   registre « déjà montré » ; toutes les transitions passent par un seul verrou
//! - **FreshQueue** : FIFO des entrées jamais sélectionnées
//! - **RandomPool** : ensemble non ordonné dont on retire un élément au hasard
//! - **PlaylistEntry** : une photo (chemin canonique + légende)
//!
//! # Exemple d'utilisation
//!
//! ```
//! use pmoplaylist::{PlaybackScheduler, PlaylistEntry};
//!
//! let scheduler = PlaybackScheduler::new();
//! let token = scheduler.on_first_fresh(|| println!("nouvelle photo !"));
//!
//! scheduler.add(PlaylistEntry::new("/photos/a.jpg", "Alice"));
//! scheduler.add(PlaylistEntry::new("/photos/b.jpg", ""));
//!
//! // Les entrées fraîches sortent dans l'ordre d'arrivée
//! assert_eq!(scheduler.pick_next().unwrap().caption(), "Alice");
//! assert!(scheduler.pick_next().is_some());
//!
//! // Puis la rotation recycle les entrées déjà vues
//! assert!(scheduler.pick_next().is_some());
//!
//! scheduler.remove_listener(token);
//! ```

mod entry;
mod fresh;
mod pool;
mod scheduler;

// Réexports publics
pub use entry::PlaylistEntry;
pub use fresh::FreshQueue;
pub use pool::RandomPool;
pub use scheduler::{ListenerToken, PickSource, PlaybackScheduler, PlaylistStats};
