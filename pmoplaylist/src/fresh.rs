//! FreshQueue : FIFO des entrées jamais sélectionnées

use parking_lot::Mutex;
use std::collections::VecDeque;

/// File ordonnée des entrées « fraîches »
///
/// Ordre de sortie = ordre d'arrivée. Pas de consultation sans retrait, pas
/// d'accès indexé.
///
/// La file porte son propre verrou : `enqueue` et `try_dequeue` peuvent être
/// appelés depuis plusieurs threads sans synchronisation externe. Dans le
/// [`PlaybackScheduler`](crate::PlaybackScheduler) elle n'est manipulée que
/// sous le verrou du scheduler, qui est toujours pris avant celui-ci.
#[derive(Debug)]
pub struct FreshQueue<T> {
    items: Mutex<VecDeque<T>>,
}

impl<T> FreshQueue<T> {
    /// Crée une file vide
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
        }
    }

    /// Ajoute une entrée en fin de file
    pub fn enqueue(&self, item: T) {
        self.items.lock().push_back(item);
    }

    /// Retire l'entrée la plus ancienne, `None` si la file est vide
    pub fn try_dequeue(&self) -> Option<T> {
        self.items.lock().pop_front()
    }

    /// Vide la file d'un coup, dans l'ordre d'arrivée
    pub fn drain(&self) -> Vec<T> {
        self.items.lock().drain(..).collect()
    }

    /// Nombre d'entrées en attente
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Vérifie si la file est vide
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

impl<T: Clone> FreshQueue<T> {
    /// Copie du contenu, dans l'ordre d'arrivée
    pub fn snapshot(&self) -> Vec<T> {
        self.items.lock().iter().cloned().collect()
    }
}

impl<T> Default for FreshQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
