use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Similarity function a search index is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Similarity {
    #[default]
    Cosine,
    Euclidean,
    DotProduct,
}

impl Similarity {
    /// Normalized score in `[0, 1]` for cosine and euclidean, higher is closer.
    /// Dot product is mapped the same way as cosine and assumes unit vectors.
    pub fn score(&self, a: &[f32], b: &[f32]) -> f64 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }
        match self {
            Similarity::Cosine => (1.0 + cosine_similarity(a, b)) / 2.0,
            Similarity::DotProduct => {
                let dot: f64 = a.iter().zip(b).map(|(x, y)| *x as f64 * *y as f64).sum();
                (1.0 + dot) / 2.0
            }
            Similarity::Euclidean => {
                let sq: f64 = a
                    .iter()
                    .zip(b)
                    .map(|(x, y)| {
                        let d = *x as f64 - *y as f64;
                        d * d
                    })
                    .sum();
                1.0 / (1.0 + sq)
            }
        }
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 { 0.0 } else { dot / denom }
}

impl fmt::Display for Similarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Similarity::Cosine => write!(f, "cosine"),
            Similarity::Euclidean => write!(f, "euclidean"),
            Similarity::DotProduct => write!(f, "dotproduct"),
        }
    }
}

impl FromStr for Similarity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cosine" => Ok(Similarity::Cosine),
            "euclidean" => Ok(Similarity::Euclidean),
            "dotproduct" | "dot_product" => Ok(Similarity::DotProduct),
            _ => Err(format!("Unknown similarity: {s}")),
        }
    }
}
