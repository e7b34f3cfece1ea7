use crate::decompose::{pack, Shape};
use crate::tree::PatternNode;
use crate::walk::walk;
use serde::Serialize;

/// One finished cluster: a root-to-leaf pattern with its usage count and the
/// sampled URLs retained at the leaf.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterOut {
    pub pattern: String,
    pub count: u64,
    pub samples: Vec<String>,
}

/// Walk a finished tree and produce one cluster per leaf.
pub fn clusters(shape: &Shape, root: &PatternNode) -> Vec<ClusterOut> {
    walk(root)
        .filter_map(|chain| {
            let leaf = chain.last()?;
            if leaf.level() == 0 {
                // an empty tree yields only its virtual root
                return None;
            }
            let values: Vec<&str> = chain[1..].iter().map(|n| n.value()).collect();
            Some(ClusterOut {
                pattern: pack(shape, &values),
                count: leaf.count(),
                samples: leaf.meta().to_vec(),
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// One pattern string per cluster.
    Pattern,
    /// Pattern string followed by one tab-indented sample URL per line.
    Cluster,
    /// One JSON object per cluster: `{"ptn": ..., "cnt": ...}`.
    Json,
}

impl Format {
    pub fn parse(name: &str) -> Option<Format> {
        match name.to_ascii_lowercase().as_str() {
            "pattern" => Some(Format::Pattern),
            "cluster" => Some(Format::Cluster),
            "json" => Some(Format::Json),
            _ => None,
        }
    }

    pub fn render(&self, cluster: &ClusterOut) -> Vec<String> {
        match self {
            Format::Pattern => vec![cluster.pattern.clone()],
            Format::Cluster => {
                let mut lines = Vec::with_capacity(1 + cluster.samples.len());
                lines.push(cluster.pattern.clone());
                for url in &cluster.samples {
                    lines.push(format!("\t{url}"));
                }
                lines
            }
            Format::Json => {
                let record = serde_json::json!({
                    "ptn": cluster.pattern,
                    "cnt": cluster.count,
                });
                vec![record.to_string()]
            }
        }
    }
}
