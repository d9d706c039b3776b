use crate::error::Result;
use crate::similarity::SimilarityEngine;

/// Simplifies a single line token by token
pub struct LineSimplifier {
    engine: SimilarityEngine,
}

impl LineSimplifier {
    pub fn new(engine: SimilarityEngine) -> Self {
        Self { engine }
    }

    /// Split on whitespace runs, map each token, re-join with single spaces
    pub fn simplify(&self, line: &str) -> Result<String> {
        let tokens = line
            .split_whitespace()
            .map(|token| self.engine.find_nearest_vocab_word(token))
            .collect::<Result<Vec<_>>>()?;
        Ok(tokens.join(" "))
    }
}
