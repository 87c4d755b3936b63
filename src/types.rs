use nalgebra::DVector;

/// A vocabulary token. Used as map key and as sequence element.
pub type Word = String;

/// Fixed-length embedding. Dimensionality is constant for a whole run.
pub type EmbeddingVector = DVector<f32>;

/// The generated sequence. Append-only while a simulation runs.
pub type Text = Vec<Word>;

/// The three rule contributions for one step. A zero vector is neutral.
#[derive(Debug, Clone, PartialEq)]
pub struct Forces {
    pub separation: EmbeddingVector,
    pub alignment: EmbeddingVector,
    pub cohesion: EmbeddingVector,
}

impl Forces {
    pub fn zeros(dim: usize) -> Self {
        Self {
            separation: EmbeddingVector::zeros(dim),
            alignment: EmbeddingVector::zeros(dim),
            cohesion: EmbeddingVector::zeros(dim),
        }
    }
}

/// Trailing slice of `text` preceding the current (last) word, at most `window` long.
pub fn neighbor_window(text: &[Word], window: usize) -> &[Word] {
    let Some(current) = text.len().checked_sub(1) else {
        return &[];
    };
    let start = current.saturating_sub(window);
    &text[start..current]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(ws: &[&str]) -> Text {
        ws.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn window_excludes_current_word() {
        let text = words(&["a", "b", "c"]);
        assert_eq!(neighbor_window(&text, 5), &text[..2]);
    }

    #[test]
    fn window_is_bounded() {
        let text = words(&["a", "b", "c", "d", "e", "f", "g", "h"]);
        let window = neighbor_window(&text, 5);
        assert_eq!(window, &words(&["c", "d", "e", "f", "g"])[..]);
    }

    #[test]
    fn window_of_single_or_empty_text_is_empty() {
        assert!(neighbor_window(&words(&["a"]), 5).is_empty());
        assert!(neighbor_window(&[], 5).is_empty());
    }
}
