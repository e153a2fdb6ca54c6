//! RandomPool : ensemble non ordonné à retrait aléatoire

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

struct PoolCore<T> {
    items: Vec<T>,
    rng: StdRng,
}

/// Pool d'entrées éligibles à la sélection aléatoire
///
/// `try_remove_random` tire un indice uniforme dans `[0, len)` et retire
/// l'élément correspondant par `swap_remove` (O(1)). L'ordre interne du
/// vecteur n'a aucune signification, donc l'échange avec le dernier élément
/// n'introduit aucun biais : chaque retrait est uniforme sur le contenu courant.
///
/// Comme [`FreshQueue`](crate::FreshQueue), le pool a son propre verrou ;
/// la cohérence d'ensemble reste assurée par le verrou du scheduler.
pub struct RandomPool<T> {
    core: Mutex<PoolCore<T>>,
}

impl<T> RandomPool<T> {
    /// Crée un pool vide avec la source aléatoire fournie
    pub fn new(rng: StdRng) -> Self {
        Self {
            core: Mutex::new(PoolCore {
                items: Vec::new(),
                rng,
            }),
        }
    }

    /// Crée un pool vide dont la source aléatoire est initialisée par l'OS
    pub fn from_os_rng() -> Self {
        Self::new(StdRng::from_os_rng())
    }

    /// Ajoute une entrée
    pub fn insert(&self, item: T) {
        self.core.lock().items.push(item);
    }

    /// Ajoute plusieurs entrées de manière atomique
    pub fn insert_all<I>(&self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.core.lock().items.extend(items);
    }

    /// Vide complètement le pool
    pub fn clear(&self) {
        self.core.lock().items.clear();
    }

    /// Retire une entrée tirée uniformément, `None` si le pool est vide
    pub fn try_remove_random(&self) -> Option<T> {
        let mut core = self.core.lock();
        if core.items.is_empty() {
            return None;
        }

        let len = core.items.len();
        let index = core.rng.random_range(0..len);
        Some(core.items.swap_remove(index))
    }

    /// Nombre d'entrées
    pub fn len(&self) -> usize {
        self.core.lock().items.len()
    }

    /// Vérifie si le pool est vide
    pub fn is_empty(&self) -> bool {
        self.core.lock().items.is_empty()
    }
}

impl<T: Clone> RandomPool<T> {
    /// Copie du contenu (ordre sans signification)
    pub fn snapshot(&self) -> Vec<T> {
        self.core.lock().items.clone()
    }
}

impl<T> std::fmt::Debug for RandomPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RandomPool")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn seeded() -> RandomPool<u32> {
        RandomPool::new(StdRng::seed_from_u64(7))
    }

    #[test]
    fn empty_pool_yields_nothing() {
        let pool = seeded();
        assert!(pool.is_empty());
        assert_eq!(pool.try_remove_random(), None);
    }

    #[test]
    fn removes_every_item_exactly_once() {
        let pool = seeded();
        pool.insert_all(0..50);
        pool.insert(50);
        assert_eq!(pool.len(), 51);

        let mut seen = Vec::new();
        while let Some(item) = pool.try_remove_random() {
            seen.push(item);
        }
        seen.sort_unstable();
        assert_eq!(seen, (0..=50).collect::<Vec<_>>());
    }

    #[test]
    fn clear_drops_everything() {
        let pool = seeded();
        pool.insert_all(vec![1, 2, 3]);
        pool.clear();
        assert!(pool.is_empty());
        assert_eq!(pool.try_remove_random(), None);
    }

    #[test]
    fn first_removal_is_not_biased_by_position() {
        // 4 éléments, 8000 tirages : chaque position doit sortir ~2000 fois
        let pool = seeded();
        let mut counts: HashMap<u32, usize> = HashMap::new();
        for _ in 0..8000 {
            pool.insert_all(0..4);
            let first = pool.try_remove_random().unwrap();
            *counts.entry(first).or_default() += 1;
            pool.clear();
        }

        assert_eq!(counts.len(), 4);
        for (item, count) in counts {
            assert!(
                (1700..=2300).contains(&count),
                "item {item} drawn first {count} times"
            );
        }
    }

    #[test]
    fn same_seed_same_order() {
        let a = RandomPool::new(StdRng::seed_from_u64(42));
        let b = RandomPool::new(StdRng::seed_from_u64(42));
        a.insert_all(0..10);
        b.insert_all(0..10);

        let order_a: Vec<_> = std::iter::from_fn(|| a.try_remove_random()).collect();
        let order_b: Vec<_> = std::iter::from_fn(|| b.try_remove_random()).collect();
        assert_eq!(order_a, order_b);
    }
}
