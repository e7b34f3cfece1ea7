use crate::tree::PatternNode;

/// Lazy root-to-leaf path enumeration over a finished tree: the sole
/// traversal primitive renderers depend on. Uses an explicit stack so very
/// deep trees cannot overflow the call stack; restartable by calling `walk`
/// again.
pub fn walk(root: &PatternNode) -> PathWalk<'_> {
    PathWalk { stack: vec![(root, 0)] }
}

pub struct PathWalk<'a> {
    // (node, index of the next child to descend into)
    stack: Vec<(&'a PatternNode, usize)>,
}

impl<'a> Iterator for PathWalk<'a> {
    type Item = Vec<&'a PatternNode>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (node, next_child) = *self.stack.last()?;
            if node.is_leaf() {
                let chain: Vec<&'a PatternNode> = self.stack.iter().map(|&(n, _)| n).collect();
                self.stack.pop();
                return Some(chain);
            }
            if next_child < node.children().len() {
                if let Some(top) = self.stack.last_mut() {
                    top.1 += 1;
                }
                self.stack.push((&node.children()[next_child], 0));
            } else {
                self.stack.pop();
            }
        }
    }
}
