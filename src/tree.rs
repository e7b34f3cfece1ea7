use crate::rules::fuzzy_pattern;
use crate::tokenize::ParsedPiece;
use ahash::AHashMap;
use std::sync::Arc;

/// Decides when same-signature literal siblings fold into one bracket-rule
/// node. `distinct` counts the distinct literals in the group (the incoming
/// piece included), `fanout` the parent's total child count.
pub trait MergePolicy {
    fn should_fold(&self, distinct: usize, fanout: usize) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdPolicy {
    /// Distinct same-signature literals required before the group folds.
    pub min_cluster: usize,
    /// Child fan-out that forces same-signature groups to fold regardless.
    pub max_fanout: usize,
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self { min_cluster: 3, max_fanout: 64 }
    }
}

impl MergePolicy for ThresholdPolicy {
    fn should_fold(&self, distinct: usize, fanout: usize) -> bool {
        distinct >= self.min_cluster || fanout >= self.max_fanout
    }
}

/// One node of a pattern tree. `value` is either the rendered literal piece
/// or a bracket-rule pattern once the node has generalized.
#[derive(Debug, Clone)]
pub struct PatternNode {
    level: usize,
    value: String,
    fuzzy_rule: String,
    count: u64,
    generalized: bool,
    piece_length: Option<usize>,
    children: Vec<PatternNode>,
    child_index: AHashMap<String, usize>,
    meta: Vec<String>,
}

impl PatternNode {
    fn root() -> Self {
        Self {
            level: 0,
            value: String::new(),
            fuzzy_rule: String::new(),
            count: 0,
            generalized: false,
            piece_length: Some(0),
            children: Vec::new(),
            child_index: AHashMap::new(),
            meta: Vec::new(),
        }
    }

    fn literal(level: usize, piece: &ParsedPiece) -> Self {
        Self {
            level,
            value: piece.rendered().to_string(),
            fuzzy_rule: piece.fuzzy_rule().to_string(),
            count: 0,
            generalized: false,
            piece_length: Some(piece.piece_length()),
            children: Vec::new(),
            child_index: AHashMap::new(),
            meta: Vec::new(),
        }
    }

    fn fuzzy(level: usize, fuzzy_rule: String, piece_length: Option<usize>) -> Self {
        let value = fuzzy_pattern(&fuzzy_rule, piece_length);
        Self {
            level,
            value,
            fuzzy_rule,
            count: 0,
            generalized: true,
            piece_length,
            children: Vec::new(),
            child_index: AHashMap::new(),
            meta: Vec::new(),
        }
    }

    /// Pattern fragment covering every piece subsumed at this position.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Number of distinct URLs subsumed by this node.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 0 for the virtual root, then 1.. per tree level.
    pub fn level(&self) -> usize {
        self.level
    }

    /// Children in insertion order.
    pub fn children(&self) -> &[PatternNode] {
        &self.children
    }

    /// Look up a child by its current value.
    pub fn child(&self, value: &str) -> Option<&PatternNode> {
        self.child_index
            .get(value)
            .map(|&i| &self.children[i])
            .or_else(|| self.children.iter().find(|c| c.value == value))
    }

    /// Sampled original URLs; non-empty only on leaf nodes.
    pub fn meta(&self) -> &[String] {
        &self.meta
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub(crate) fn fuzzy_rule(&self) -> &str {
        &self.fuzzy_rule
    }

    /// Widen the generalized value to admit a piece of the given length.
    /// `{n}` survives only while every admitted piece has length n.
    fn widen(&mut self, piece_length: usize) {
        if self.piece_length != Some(piece_length) {
            self.piece_length = None;
            self.value = fuzzy_pattern(&self.fuzzy_rule, None);
        }
    }

    fn reindex(&mut self) {
        self.child_index.clear();
        for (i, c) in self.children.iter().enumerate() {
            if !c.generalized {
                self.child_index.insert(c.value.clone(), i);
            }
        }
    }

    /// Merge `source` into this node: counts sum, metas concatenate up to the
    /// cap, child sets combine key-wise and the merged set is re-checked
    /// against the fold policy.
    fn absorb(&mut self, source: PatternNode, policy: &dyn MergePolicy, max_samples: usize) {
        debug_assert_eq!(self.level, source.level);
        self.count += source.count;
        if self.piece_length != source.piece_length {
            self.piece_length = None;
        }
        if self.generalized {
            self.value = fuzzy_pattern(&self.fuzzy_rule, self.piece_length);
        }
        for url in source.meta {
            if self.meta.len() < max_samples {
                self.meta.push(url);
            }
        }
        for child in source.children {
            self.adopt(child, policy, max_samples);
        }
        self.refold(policy, max_samples);
    }

    fn adopt(&mut self, child: PatternNode, policy: &dyn MergePolicy, max_samples: usize) {
        if child.generalized {
            if let Some(i) = self.position_generalized(&child.fuzzy_rule) {
                self.children[i].absorb(child, policy, max_samples);
                return;
            }
            // an arriving rule node pulls in same-signature literal siblings
            let group = self.literal_group(&child.fuzzy_rule);
            if group.is_empty() {
                self.children.push(child);
                return;
            }
            let pos = group[0];
            let removed = self.remove_group(&group);
            self.children.insert(pos, child);
            self.reindex();
            for lit in removed {
                self.children[pos].absorb(lit, policy, max_samples);
            }
        } else {
            if let Some(&i) = self.child_index.get(&child.value) {
                self.children[i].absorb(child, policy, max_samples);
                return;
            }
            if let Some(i) = self.position_generalized(&child.fuzzy_rule) {
                self.children[i].absorb(child, policy, max_samples);
                return;
            }
            self.child_index.insert(child.value.clone(), self.children.len());
            self.children.push(child);
        }
    }

    fn position_generalized(&self, fuzzy_rule: &str) -> Option<usize> {
        if fuzzy_rule.is_empty() {
            return None;
        }
        self.children
            .iter()
            .position(|c| c.generalized && c.fuzzy_rule == fuzzy_rule)
    }

    fn literal_group(&self, fuzzy_rule: &str) -> Vec<usize> {
        if fuzzy_rule.is_empty() {
            return Vec::new();
        }
        self.children
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.generalized && c.fuzzy_rule == fuzzy_rule)
            .map(|(i, _)| i)
            .collect()
    }

    fn remove_group(&mut self, indices: &[usize]) -> Vec<PatternNode> {
        let mut removed: Vec<PatternNode> = Vec::with_capacity(indices.len());
        for &i in indices.iter().rev() {
            removed.push(self.children.remove(i));
        }
        removed.reverse();
        removed
    }

    /// Fold the literal children at `indices` (all sharing one signature)
    /// into a single rule node placed at the first group position.
    fn fold_group(&mut self, indices: &[usize], policy: &dyn MergePolicy, max_samples: usize) {
        let pos = indices[0];
        let removed = self.remove_group(indices);
        let fuzzy_rule = removed[0].fuzzy_rule.clone();
        let level = removed[0].level;
        let piece_length = removed[0].piece_length;
        self.children
            .insert(pos, PatternNode::fuzzy(level, fuzzy_rule, piece_length));
        self.reindex();
        for lit in removed {
            self.children[pos].absorb(lit, policy, max_samples);
        }
    }

    fn refold(&mut self, policy: &dyn MergePolicy, max_samples: usize) {
        loop {
            let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
            for (i, c) in self.children.iter().enumerate() {
                if c.generalized || c.fuzzy_rule.is_empty() {
                    continue;
                }
                match groups.iter_mut().find(|(fr, _)| *fr == c.fuzzy_rule) {
                    Some((_, idxs)) => idxs.push(i),
                    None => groups.push((c.fuzzy_rule.clone(), vec![i])),
                }
            }
            let fanout = self.children.len();
            let candidate = groups
                .into_iter()
                .find(|(_, idxs)| idxs.len() >= 2 && policy.should_fold(idxs.len(), fanout));
            match candidate {
                Some((_, idxs)) => self.fold_group(&idxs, policy, max_samples),
                None => break,
            }
        }
    }
}

/// One clustering trie per Shape. Levels 1..path_depth hold path segments,
/// the next query_depth levels hold query values in key order, the optional
/// last level holds the fragment.
#[derive(Debug, Clone)]
pub struct PatternTree {
    root: PatternNode,
    depth: usize,
    max_samples: usize,
}

impl PatternTree {
    pub fn new(depth: usize, max_samples: usize) -> Self {
        Self { root: PatternNode::root(), depth, max_samples }
    }

    pub fn root(&self) -> &PatternNode {
        &self.root
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Insert one distinct URL's piece sequence, walking level by level. At
    /// each level the piece reuses an exact literal child, joins an existing
    /// same-signature rule node, folds a literal group the policy approves,
    /// or starts a new literal branch.
    pub fn insert(&mut self, pieces: &[Arc<ParsedPiece>], url: &str, policy: &dyn MergePolicy) {
        debug_assert_eq!(pieces.len(), self.depth);
        let max_samples = self.max_samples;
        self.root.count += 1;
        let mut node = &mut self.root;
        for (i, piece) in pieces.iter().enumerate() {
            debug_assert!(!piece.tokens().is_empty() || piece.rendered().is_empty());
            let idx = Self::step(node, piece, policy, max_samples);
            let child = &mut node.children[idx];
            child.count += 1;
            if i + 1 == pieces.len() && child.meta.len() < max_samples {
                child.meta.push(url.to_string());
            }
            node = child;
        }
    }

    fn step(
        node: &mut PatternNode,
        piece: &ParsedPiece,
        policy: &dyn MergePolicy,
        max_samples: usize,
    ) -> usize {
        if let Some(&idx) = node.child_index.get(piece.rendered()) {
            return idx;
        }
        if let Some(idx) = node.position_generalized(piece.fuzzy_rule()) {
            node.children[idx].widen(piece.piece_length());
            return idx;
        }
        let group = node.literal_group(piece.fuzzy_rule());
        if !group.is_empty() && policy.should_fold(group.len() + 1, node.children.len() + 1) {
            node.fold_group(&group, policy, max_samples);
            let idx = group[0];
            node.children[idx].widen(piece.piece_length());
            return idx;
        }
        let idx = node.children.len();
        node.child_index
            .insert(piece.rendered().to_string(), idx);
        node.children.push(PatternNode::literal(node.level + 1, piece));
        idx
    }
}
