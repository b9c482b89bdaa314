/*!

Structural hashing and common-subexpression elimination.

Hashing is a single leaf-first DFS (stage: leave-expression, no revisits); each node's
handler computes a hash from its own data and its already-visited children's hashes,
stashed in the iterator's own per-node user-data slot. CSE then probes a multimap keyed by
hash, using each handler's `compare` to resolve collisions, and retargets child edges (and
constraint roots) to the canonical representative.

*/

use crate::abstractions::HashMap;
use crate::api::node::{ExprNode, NodeId};
use crate::core::error::{CoreError, CoreResult};
use crate::core::iterator::{ExprIterator, IterData, Stage, TraversalType};
use crate::core::iterator_pool::ActiveIteratorPool;

/// Computes a structural hash for every node reachable from `root`, visiting each distinct
/// node once regardless of how many parents reach it.
pub fn hash_subtree(pool: &mut ActiveIteratorPool, root: &ExprNode) -> CoreResult<HashMap<NodeId, u32>> {
  let mut hashes = HashMap::new();
  let mut iter = ExprIterator::new(pool, root.clone(), TraversalType::DepthFirst, Stage::LeaveExpression.into(), false)?;

  while iter.next().is_some() {
    let node = iter.current().unwrap();
    let child_hashes: Vec<u32> = node
        .children()
        .iter()
        .map(|c| *hashes.get(&c.id()).expect("children visited before parent in leaf-first DFS"))
        .collect();
    let handler = node.handler();
    let hash = handler
        .hash(&node, &child_hashes)
        .ok_or_else(|| CoreError::PluginLookupError { name: format!("{} has no hash callback", handler.name()) })?;
    iter.set_user_data(&node, IterData::Int(hash as i64));
    hashes.insert(node.id(), hash);
  }
  iter.release(pool);
  Ok(hashes)
}

/// A multimap from structural hash to the distinct, already-canonicalized nodes sharing it.
#[derive(Default)]
pub struct CseTable {
  buckets: HashMap<u32, Vec<ExprNode>>,
}

impl CseTable {
  pub fn new() -> Self {
    CseTable::default()
  }

  /// Finds a node structurally equal to `candidate` (per its handler's `compare`), if one
  /// is already registered under `candidate`'s hash.
  pub fn find_equivalent(&self, candidate: &ExprNode, hash: u32) -> CoreResult<Option<ExprNode>> {
    let Some(bucket) = self.buckets.get(&hash) else { return Ok(None) };
    let handler = candidate.handler();
    for existing in bucket {
      if existing.handler_name() != candidate.handler_name() {
        continue;
      }
      let ordering = handler
          .compare(existing, candidate)
          .ok_or_else(|| CoreError::PluginLookupError { name: format!("{} has no compare callback", handler.name()) })?;
      if ordering == std::cmp::Ordering::Equal {
        return Ok(Some(existing.clone()));
      }
    }
    Ok(None)
  }

  pub fn insert(&mut self, hash: u32, node: ExprNode) {
    self.buckets.entry(hash).or_default().push(node);
  }
}

/// Runs CSE over a whole constraint set's roots: hashes every reachable node, then replaces
/// each child edge (and, if warranted, the root itself) with an equivalent already-seen
/// node. Returns the (possibly replaced) roots, in input order.
pub fn eliminate_common_subexpressions(
  pool: &mut ActiveIteratorPool,
  roots: &[ExprNode],
) -> CoreResult<Vec<ExprNode>> {
  let mut table = CseTable::new();
  let mut canonical: HashMap<NodeId, ExprNode> = HashMap::new();

  for root in roots {
    canonicalize_subtree(pool, root, &mut table, &mut canonical)?;
  }

  roots
      .iter()
      .map(|root| Ok(canonical.get(&root.id()).cloned().unwrap_or_else(|| root.clone())))
      .collect()
}

/// Bottom-up: replaces each already-processed node with its canonical representative,
/// retargeting child edges as it goes, then probes/inserts the (possibly already-rewritten)
/// node itself.
fn canonicalize_subtree(
  pool: &mut ActiveIteratorPool,
  node: &ExprNode,
  table: &mut CseTable,
  canonical: &mut HashMap<NodeId, ExprNode>,
) -> CoreResult<ExprNode> {
  if let Some(existing) = canonical.get(&node.id()) {
    return Ok(existing.clone());
  }

  for (index, child) in node.children().into_iter().enumerate() {
    let replacement = canonicalize_subtree(pool, &child, table, canonical)?;
    if !replacement.ptr_eq(&child) {
      node.set_child(index, replacement);
    }
  }

  let hashes = hash_subtree(pool, node)?;
  let hash = *hashes.get(&node.id()).expect("node was just hashed");

  let result = match table.find_equivalent(node, hash)? {
    Some(equivalent) => equivalent,
    None => {
      table.insert(hash, node.clone());
      node.clone()
    }
  };
  canonical.insert(node.id(), result.clone());
  Ok(result)
}
