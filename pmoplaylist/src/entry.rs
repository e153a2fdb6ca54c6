//! PlaylistEntry : une photo connue du diaporama

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

/// Une entrée de la playlist
///
/// L'identité d'une entrée est son chemin canonique : deux entrées avec le même
/// chemin sont égales, quelle que soit leur légende. Le scheduler, lui, ne
/// compare jamais les entrées ; l'égalité ne sert qu'aux producteurs (scanner)
/// et aux tests.
#[derive(Debug, Clone)]
pub struct PlaylistEntry {
    /// Chemin canonique du fichier
    path: PathBuf,

    /// Légende affichée (éventuellement vide)
    caption: String,
}

impl PlaylistEntry {
    /// Crée une nouvelle entrée
    pub fn new(path: impl Into<PathBuf>, caption: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            caption: caption.into(),
        }
    }

    /// Chemin canonique du fichier
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Légende (chaîne vide si aucune)
    pub fn caption(&self) -> &str {
        &self.caption
    }
}

impl PartialEq for PlaylistEntry {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for PlaylistEntry {}

impl Hash for PlaylistEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

impl PartialOrd for PlaylistEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PlaylistEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.path.cmp(&other.path)
    }
}

impl fmt::Display for PlaylistEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.caption.is_empty() {
            return f.write_str(&self.caption);
        }
        match self.path.file_name() {
            Some(name) => write!(f, "{}", name.to_string_lossy()),
            None => write!(f, "{}", self.path.display()),
        }
    }
}
