//! Payload fixtures.

/// `n` distinct labels: `"{prefix}-0"`, `"{prefix}-1"`, ...
#[must_use]
pub fn labels(prefix: &str, n: usize) -> Vec<String> {
    (0..n).map(|i| format!("{prefix}-{i}")).collect()
}

/// A payload whose clones can be told apart from the value that was
/// published, for checking that every subscriber gets its own copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tagged {
    /// Which producer published the value.
    pub producer: usize,
    /// Position within that producer's own sequence.
    pub seq: usize,
}

impl Tagged {
    /// Build a tagged payload.
    #[must_use]
    pub fn new(producer: usize, seq: usize) -> Self {
        Self { producer, seq }
    }
}

/// Keep only `producer`'s entries, in the order they appear.
#[must_use]
pub fn sequence_of(values: &[Tagged], producer: usize) -> Vec<usize> {
    values
        .iter()
        .filter(|t| t.producer == producer)
        .map(|t| t.seq)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(labels("x", 3), vec!["x-0", "x-1", "x-2"]);
        assert!(labels("x", 0).is_empty());
    }

    #[test]
    fn test_sequence_of() {
        let values = vec![Tagged::new(0, 0), Tagged::new(1, 0), Tagged::new(0, 1)];
        assert_eq!(sequence_of(&values, 0), vec![0, 1]);
        assert_eq!(sequence_of(&values, 1), vec![0]);
        assert!(sequence_of(&values, 2).is_empty());
    }
}
