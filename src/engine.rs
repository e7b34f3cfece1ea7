use crate::decompose::{decompose, InvalidUrl, Shape};
use crate::signature;
use crate::tokenize::{ParsedPiece, PieceParser};
use crate::tree::{MergePolicy, PatternNode, PatternTree, ThresholdPolicy};
use ahash::{AHashMap, AHashSet};
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Leaf-sample cap: URLs beyond it still count but are not retained.
    pub max_samples: usize,
    /// Tokenizer memo-table capacity, in entries.
    pub cache_capacity: usize,
    pub min_cluster: usize,
    pub max_fanout: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let policy = ThresholdPolicy::default();
        Self {
            max_samples: 8,
            cache_capacity: 8192,
            min_cluster: policy.min_cluster,
            max_fanout: policy.max_fanout,
        }
    }
}

/// Orchestrates ingestion: decomposes each URL, dedups by full-URL identity,
/// and routes the piece sequence into the tree for its Shape. One tree per
/// distinct Shape, created lazily and never destroyed.
pub struct PatternEngine {
    parser: PieceParser,
    index: AHashMap<Shape, usize>,
    trees: Vec<(Shape, PatternTree)>,
    seen: AHashSet<String>,
    policy: Box<dyn MergePolicy>,
    max_samples: usize,
}

impl PatternEngine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let policy = ThresholdPolicy {
            min_cluster: config.min_cluster,
            max_fanout: config.max_fanout,
        };
        Self::with_policy(config, Box::new(policy))
    }

    pub fn with_policy(config: EngineConfig, policy: Box<dyn MergePolicy>) -> Self {
        Self {
            parser: PieceParser::with_capacity(config.cache_capacity),
            index: AHashMap::new(),
            trees: Vec::new(),
            seen: AHashSet::new(),
            policy,
            max_samples: config.max_samples,
        }
    }

    /// Ingest one URL. Returns whether this exact URL string was seen for the
    /// first time; duplicates touch neither tree counts nor samples.
    /// Malformed URLs fail with `InvalidUrl` and leave the engine untouched.
    pub fn load(&mut self, url: &str) -> Result<bool, InvalidUrl> {
        let (shape, raw_pieces) = decompose(url)?;
        if self.seen.contains(url) {
            return Ok(false);
        }
        self.seen.insert(url.to_string());
        let pieces: Vec<Arc<ParsedPiece>> =
            raw_pieces.iter().map(|p| self.parser.parse(p)).collect();
        let idx = match self.index.get(&shape) {
            Some(&i) => i,
            None => {
                let i = self.trees.len();
                let tree = PatternTree::new(shape.depth(), self.max_samples);
                self.index.insert(shape.clone(), i);
                self.trees.push((shape, tree));
                i
            }
        };
        let (_, tree) = &mut self.trees[idx];
        tree.insert(&pieces, url, self.policy.as_ref());
        Ok(true)
    }

    /// Enumerate every finished tree in Shape creation order.
    pub fn process(&self) -> impl Iterator<Item = (&Shape, &PatternNode)> {
        self.trees.iter().map(|(shape, tree)| (shape, tree.root()))
    }

    /// Structural cluster id of a URL, without ingesting it.
    pub fn struct_id_of(&mut self, url: &str) -> Result<String, InvalidUrl> {
        let (shape, raw_pieces) = decompose(url)?;
        let pieces: Vec<Arc<ParsedPiece>> =
            raw_pieces.iter().map(|p| self.parser.parse(p)).collect();
        Ok(signature::struct_id(&shape, &pieces))
    }

    /// Number of distinct URL strings ingested so far.
    pub fn url_count(&self) -> usize {
        self.seen.len()
    }

    pub fn shape_count(&self) -> usize {
        self.trees.len()
    }
}

impl Default for PatternEngine {
    fn default() -> Self {
        Self::new()
    }
}
