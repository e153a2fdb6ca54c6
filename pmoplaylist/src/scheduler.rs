//! PlaybackScheduler : cœur de la rotation
//!
//! Trois conteneurs, une seule exclusion :
//!
//! - `fresh` : entrées jamais sélectionnées (FIFO)
//! - `pool` : entrées éligibles au tirage aléatoire pour le cycle courant
//! - `shown` : entrées déjà sélectionnées pendant le cycle courant
//!
//! Une entrée ajoutée appartient à exactement un de ces conteneurs. `shown` ne
//! grossit que par sélection et ne se vide qu'en bloc, dans `pool`, au moment
//! où `pool` et `fresh` sont tous deux vides lors d'une sélection.

use crate::entry::PlaylistEntry;
use crate::fresh::FreshQueue;
use crate::pool::RandomPool;
use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

type Listener = Arc<dyn Fn() + Send + Sync>;

/// Jeton d'enregistrement d'un listener, à rendre à
/// [`PlaybackScheduler::remove_listener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerToken(u64);

/// Provenance d'une sélection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickSource {
    /// Sortie de la file fraîche (jamais montrée auparavant)
    Fresh,
    /// Tirée au hasard dans le pool du cycle courant
    Pool,
    /// Tirée au hasard juste après le recyclage de `shown` dans le pool
    Recycled,
}

impl PickSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PickSource::Fresh => "fresh",
            PickSource::Pool => "pool",
            PickSource::Recycled => "recycled",
        }
    }
}

impl fmt::Display for PickSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compteurs instantanés du scheduler (pris sous le verrou)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaylistStats {
    /// Entrées jamais sélectionnées
    pub fresh: usize,
    /// Entrées restant à tirer dans le cycle courant
    pub pool: usize,
    /// Entrées déjà montrées dans le cycle courant
    pub shown: usize,
    /// Nombre de recyclages effectués depuis la création
    pub cycles: u64,
}

impl PlaylistStats {
    /// Nombre total d'entrées connues
    pub fn total(&self) -> usize {
        self.fresh + self.pool + self.shown
    }
}

struct Picked<T> {
    item: T,
    source: PickSource,
    recycled: usize,
}

/// État protégé par le verrou du scheduler
struct SchedulerState<T> {
    fresh: FreshQueue<T>,
    pool: RandomPool<T>,
    shown: Vec<T>,
    last_pick_from_pool: bool,
    cycles: u64,
}

impl<T: Clone> SchedulerState<T> {
    fn pick(&mut self) -> Option<Picked<T>> {
        // 1. Les entrées fraîches passent toujours en premier, dans l'ordre
        if let Some(item) = self.fresh.try_dequeue() {
            self.shown.push(item.clone());
            return Some(Picked {
                item,
                source: PickSource::Fresh,
                recycled: 0,
            });
        }

        // 2. Sinon tirage dans le pool du cycle courant
        if let Some(item) = self.pool.try_remove_random() {
            self.last_pick_from_pool = true;
            self.shown.push(item.clone());
            return Some(Picked {
                item,
                source: PickSource::Pool,
                recycled: 0,
            });
        }

        // 3. Pool épuisé et file fraîche vide : nouveau cycle
        let recycled = std::mem::take(&mut self.shown);
        let count = recycled.len();
        self.pool.insert_all(recycled);
        self.last_pick_from_pool = true;

        // 4. Rien n'a jamais été ajouté
        let item = self.pool.try_remove_random()?;
        self.cycles += 1;
        self.shown.push(item.clone());
        Some(Picked {
            item,
            source: PickSource::Recycled,
            recycled: count,
        })
    }
}

/// Scheduler de rotation « fraîches d'abord, recyclage équitable »
///
/// Sûr pour un nombre quelconque de producteurs (`add`) et de consommateurs
/// (`pick_next`) concurrents. Aucune opération ne bloque au-delà de la
/// section critique, qui ne fait que déplacer des valeurs en mémoire.
///
/// # Signal « première fraîche après une période sèche »
///
/// Quand `add` est appelé alors que la dernière sélection venait du pool (ou
/// qu'aucune sélection n'a encore eu lieu), les listeners enregistrés via
/// [`on_first_fresh`](Self::on_first_fresh) sont appelés une fois, sur le
/// thread appelant, après libération du verrou. Les ajouts suivants ne
/// relancent pas le signal tant qu'une sélection n'est pas revenue au pool.
pub struct PlaybackScheduler<T = PlaylistEntry> {
    state: Mutex<SchedulerState<T>>,
    listeners: RwLock<BTreeMap<ListenerToken, Listener>>,
    listener_counter: AtomicU64,
}

impl<T> PlaybackScheduler<T> {
    /// Crée un scheduler vide, source aléatoire initialisée par l'OS
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Crée un scheduler vide avec une source aléatoire explicite
    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            state: Mutex::new(SchedulerState {
                fresh: FreshQueue::new(),
                pool: RandomPool::new(rng),
                shown: Vec::new(),
                // Un ajout avant toute sélection compte comme « après période sèche »
                last_pick_from_pool: true,
                cycles: 0,
            }),
            listeners: RwLock::new(BTreeMap::new()),
            listener_counter: AtomicU64::new(1),
        }
    }

    /// Ajoute une entrée fraîche
    ///
    /// Déclenche le signal « première fraîche » si la dernière sélection
    /// venait du pool.
    pub fn add(&self, item: T) {
        let first_fresh = {
            let mut state = self.state.lock();
            let first_fresh = state.last_pick_from_pool;
            // Réarmé uniquement par une sélection dans le pool
            state.last_pick_from_pool = false;
            state.fresh.enqueue(item);
            first_fresh
        };

        if first_fresh {
            self.notify_first_fresh();
        }
    }

    /// Verse toute la file fraîche dans le pool aléatoire
    ///
    /// Utilisé une fois au démarrage, après le scan initial, pour que l'arriéré
    /// entre en rotation aléatoire plutôt que dans l'ordre d'arrivée. Ne touche
    /// pas à l'état du signal.
    pub fn promote_all_fresh_to_pool(&self) {
        let promoted = {
            let state = self.state.lock();
            let backlog = state.fresh.drain();
            let count = backlog.len();
            state.pool.insert_all(backlog);
            count
        };

        debug!(promoted, "Fresh backlog moved into random rotation");
    }

    /// Enregistre un listener du signal « première fraîche après période sèche »
    ///
    /// Retourne un jeton pour le désenregistrer plus tard.
    pub fn on_first_fresh<F>(&self, listener: F) -> ListenerToken
    where
        F: Fn() + Send + Sync + 'static,
    {
        let token = ListenerToken(self.listener_counter.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().insert(token, Arc::new(listener));
        token
    }

    /// Désenregistre un listener. Retourne `false` si le jeton est inconnu.
    pub fn remove_listener(&self, token: ListenerToken) -> bool {
        self.listeners.write().remove(&token).is_some()
    }

    /// Compteurs instantanés
    pub fn stats(&self) -> PlaylistStats {
        let state = self.state.lock();
        PlaylistStats {
            fresh: state.fresh.len(),
            pool: state.pool.len(),
            shown: state.shown.len(),
            cycles: state.cycles,
        }
    }

    /// Nombre total d'entrées connues
    pub fn len(&self) -> usize {
        self.stats().total()
    }

    /// Vérifie si aucune entrée n'a été ajoutée
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn notify_first_fresh(&self) {
        // Copie du registre : un listener peut rappeler le scheduler sans interblocage
        let listeners: Vec<Listener> = self.listeners.read().values().cloned().collect();
        trace!(
            listeners = listeners.len(),
            "First fresh entry after a dry spell"
        );
        for listener in listeners {
            listener();
        }
    }
}

impl<T: Clone> PlaybackScheduler<T> {
    /// Sélectionne la prochaine entrée à montrer
    ///
    /// `None` signifie « rien à montrer pour l'instant » (aucun ajout encore) ;
    /// ce n'est pas une erreur.
    pub fn pick_next(&self) -> Option<T> {
        self.pick_next_with_source().map(|(item, _)| item)
    }

    /// Comme [`pick_next`](Self::pick_next), en indiquant la provenance
    pub fn pick_next_with_source(&self) -> Option<(T, PickSource)> {
        let picked = self.state.lock().pick();

        let Some(picked) = picked else {
            trace!("Nothing to pick yet");
            return None;
        };

        if picked.source == PickSource::Recycled {
            debug!(recycled = picked.recycled, "Pool exhausted, new cycle started");
        }
        debug!(source = %picked.source, "Picked next entry");
        Some((picked.item, picked.source))
    }

    /// Toutes les entrées connues : fraîches (ordre d'arrivée), pool, puis déjà montrées
    pub fn known_items(&self) -> Vec<T> {
        let state = self.state.lock();
        let mut items = state.fresh.snapshot();
        items.extend(state.pool.snapshot());
        items.extend(state.shown.iter().cloned());
        items
    }
}

impl<T> Default for PlaybackScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for PlaybackScheduler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackScheduler")
            .field("stats", &self.stats())
            .field("listeners", &self.listeners.read().len())
            .finish()
    }
}
