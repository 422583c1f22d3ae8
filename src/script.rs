use std::collections::HashMap;

use derivative::Derivative;

use crate::block::{BlockKind, BlockType, Parameters};

/// Generational handle into a script's block arena. Handles of removed blocks never resolve
/// again, even after their slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId {
  index: u32,
  generation: u32,
}

#[derive(Debug, Clone)]
pub struct Block {
  pub key: String,
  pub kind: BlockKind,
  pub parent: Option<BlockId>,
  pub children: Vec<BlockId>,
}

#[derive(Debug, Clone)]
struct Slot {
  generation: u32,
  block: Option<Block>,
}

/// One behavior unit attached to an entity: an ordered list of root blocks and their subtrees.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct Script {
  pub id: String,
  pub name: String,
  roots: Vec<BlockId>,
  slots: Vec<Slot>,
  #[derivative(Debug = "ignore")]
  free: Vec<u32>,
  #[derivative(Debug = "ignore")]
  key_to_id: HashMap<String, BlockId>,
}

impl Script {
  pub fn new(id: impl Into<String>, name: impl Into<String>) -> Script {
    Script {
      id: id.into(),
      name: name.into(),
      roots: Vec::new(),
      slots: Vec::new(),
      free: Vec::new(),
      key_to_id: HashMap::new(),
    }
  }

  pub fn roots(&self) -> &[BlockId] {
    &self.roots
  }

  pub fn get(&self, id: BlockId) -> Option<&Block> {
    let slot = self.slots.get(id.index as usize)?;
    if slot.generation != id.generation {
      return None;
    }
    slot.block.as_ref()
  }

  fn get_mut(&mut self, id: BlockId) -> Option<&mut Block> {
    let slot = self.slots.get_mut(id.index as usize)?;
    if slot.generation != id.generation {
      return None;
    }
    slot.block.as_mut()
  }

  pub fn kind(&self, id: BlockId) -> Option<&BlockKind> {
    self.get(id).map(|block| &block.kind)
  }

  /// Children of a container. Stale ids and non-container blocks have none.
  pub fn children(&self, id: BlockId) -> &[BlockId] {
    match self.get(id) {
      Some(block) if block.kind.is_container() => &block.children,
      _ => &[],
    }
  }

  pub fn lookup(&self, key: &str) -> Option<BlockId> {
    self.key_to_id.get(key).copied()
  }

  pub fn len(&self) -> usize {
    self.key_to_id.len()
  }

  pub fn is_empty(&self) -> bool {
    self.key_to_id.is_empty()
  }

  /// First root block of the given trigger type; later duplicates never fire.
  pub fn first_root(&self, ty: BlockType) -> Option<BlockId> {
    self
      .roots
      .iter()
      .copied()
      .find(|&id| self.kind(id).and_then(BlockKind::block_type) == Some(ty))
  }

  /// Appends a block to the end of `parent`'s children, or to the roots. Returns `None` for a
  /// duplicate key or an unknown parent.
  pub fn insert(
    &mut self,
    key: impl Into<String>,
    kind: BlockKind,
    parent: Option<BlockId>,
  ) -> Option<BlockId> {
    let key = key.into();
    if self.key_to_id.contains_key(&key) {
      return None;
    }
    if let Some(parent) = parent {
      self.get(parent)?;
    }
    let block = Block {
      key: key.clone(),
      kind,
      parent,
      children: Vec::new(),
    };
    let id = match self.free.pop() {
      Some(index) => {
        let slot = &mut self.slots[index as usize];
        slot.block = Some(block);
        BlockId {
          index,
          generation: slot.generation,
        }
      }
      None => {
        self.slots.push(Slot {
          generation: 0,
          block: Some(block),
        });
        BlockId {
          index: (self.slots.len() - 1) as u32,
          generation: 0,
        }
      }
    };
    self.key_to_id.insert(key, id);
    self.siblings_mut(parent)?.push(id);
    Some(id)
  }

  pub fn update_parameters(&mut self, key: &str, parameters: &Parameters) -> bool {
    let Some(id) = self.lookup(key) else {
      return false;
    };
    match self.get_mut(id) {
      Some(block) => {
        block.kind.apply_parameters(parameters);
        true
      }
      None => false,
    }
  }

  /// Removes a block together with its subtree.
  pub fn remove(&mut self, key: &str) -> bool {
    let Some(id) = self.lookup(key) else {
      return false;
    };
    let Some(parent) = self.get(id).map(|block| block.parent) else {
      return false;
    };
    if let Some(siblings) = self.siblings_mut(parent) {
      siblings.retain(|&sibling| sibling != id);
    }
    let mut pending = vec![id];
    while let Some(id) = pending.pop() {
      let slot = &mut self.slots[id.index as usize];
      if let Some(block) = slot.block.take() {
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.key_to_id.remove(&block.key);
        pending.extend(block.children);
      }
    }
    true
  }

  /// Moves `source` (with its subtree) so it sits right before `target` among `target`'s
  /// siblings. Refuses moves that would put a block inside its own subtree.
  pub fn reorder(&mut self, source: &str, target: &str) -> bool {
    let (Some(source), Some(target)) = (self.lookup(source), self.lookup(target)) else {
      return false;
    };
    if source == target || self.is_ancestor(source, target) {
      return false;
    }
    let Some(old_parent) = self.get(source).map(|block| block.parent) else {
      return false;
    };
    let Some(new_parent) = self.get(target).map(|block| block.parent) else {
      return false;
    };
    if let Some(siblings) = self.siblings_mut(old_parent) {
      siblings.retain(|&sibling| sibling != source);
    }
    let Some(siblings) = self.siblings_mut(new_parent) else {
      return false;
    };
    let position = siblings
      .iter()
      .position(|&sibling| sibling == target)
      .unwrap_or(siblings.len());
    siblings.insert(position, source);
    if let Some(block) = self.get_mut(source) {
      block.parent = new_parent;
    }
    true
  }

  fn is_ancestor(&self, ancestor: BlockId, id: BlockId) -> bool {
    let mut current = self.get(id).and_then(|block| block.parent);
    while let Some(parent) = current {
      if parent == ancestor {
        return true;
      }
      current = self.get(parent).and_then(|block| block.parent);
    }
    false
  }

  fn siblings_mut(&mut self, parent: Option<BlockId>) -> Option<&mut Vec<BlockId>> {
    match parent {
      Some(parent) => self.get_mut(parent).map(|block| &mut block.children),
      None => Some(&mut self.roots),
    }
  }
}
