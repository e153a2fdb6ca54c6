//! Convention de nommage : `[Légende] reste du nom.jpg`

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static CAPTION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(.*)\]").expect("caption pattern is a valid regex"));

/// Extrait la légende d'un nom de fichier
///
/// La légende est le texte compris entre le premier `[` et le dernier `]` du
/// nom sans extension. Sans crochets, la légende est vide.
pub fn caption_from_filename(path: &Path) -> String {
    let Some(stem) = path.file_stem() else {
        return String::new();
    };

    let stem = stem.to_string_lossy();
    CAPTION_PATTERN
        .captures(&stem)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}
