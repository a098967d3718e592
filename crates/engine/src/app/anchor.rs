use thiserror::Error;

use super::Vec2;

/// Handle to a node in an [`AnchorArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnchorId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AnchorError {
    #[error("anchor {0:?} does not exist in this arena")]
    UnknownAnchor(AnchorId),
    #[error("re-parenting {child:?} under {parent:?} would create a cycle")]
    WouldCycle { child: AnchorId, parent: AnchorId },
}

#[derive(Debug, Clone)]
struct AnchorNode {
    parent: Option<AnchorId>,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    units: u32,
}

/// Parent-relative position/size nodes forming the coordinate tree for all
/// spatial entities. Global coordinates are the sum of offsets up the parent
/// chain. Nodes live in an arena and refer to parents by index; the
/// structure is a strict tree — `set_parent` rejects anything that would
/// close a cycle.
#[derive(Debug, Clone, Default)]
pub struct AnchorArena {
    nodes: Vec<AnchorNode>,
}

impl AnchorArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self) -> AnchorId {
        self.nodes.push(AnchorNode {
            parent: None,
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
            units: 1,
        });
        AnchorId(self.nodes.len() - 1)
    }

    pub fn set_parent(&mut self, child: AnchorId, parent: AnchorId) -> Result<(), AnchorError> {
        self.check(child)?;
        self.check(parent)?;
        // Walk up from the requested parent; finding the child means the
        // child is an ancestor and the link would close a cycle.
        let mut cursor = Some(parent);
        while let Some(id) = cursor {
            if id == child {
                return Err(AnchorError::WouldCycle { child, parent });
            }
            cursor = self.nodes[id.0].parent;
        }
        self.nodes[child.0].parent = Some(parent);
        Ok(())
    }

    pub fn move_to(&mut self, id: AnchorId, x: f32, y: f32) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.x = x;
            node.y = y;
        }
    }

    pub fn resize(&mut self, id: AnchorId, width: f32, height: f32) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.width = width.max(0.0);
            node.height = height.max(0.0);
        }
    }

    /// Set the grid the anchor's coordinates are measured in (1 = pixels,
    /// `tile_grid` = tile units). Metadata only; callers that require a
    /// particular unit validate against it.
    pub fn graticulate(&mut self, id: AnchorId, units: u32) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.units = units.max(1);
        }
    }

    pub fn position(&self, id: AnchorId) -> Vec2 {
        self.nodes
            .get(id.0)
            .map(|node| Vec2 {
                x: node.x,
                y: node.y,
            })
            .unwrap_or_default()
    }

    pub fn size(&self, id: AnchorId) -> Vec2 {
        self.nodes
            .get(id.0)
            .map(|node| Vec2 {
                x: node.width,
                y: node.height,
            })
            .unwrap_or_default()
    }

    pub fn units(&self, id: AnchorId) -> u32 {
        self.nodes.get(id.0).map(|node| node.units).unwrap_or(1)
    }

    /// Recursive sum of the node's offset and every ancestor's offset.
    pub fn global_position(&self, id: AnchorId) -> Vec2 {
        let mut total = Vec2::default();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(node) = self.nodes.get(current.0) else {
                break;
            };
            total.x += node.x;
            total.y += node.y;
            cursor = node.parent;
        }
        total
    }

    fn check(&self, id: AnchorId) -> Result<(), AnchorError> {
        if id.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(AnchorError::UnknownAnchor(id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_position_sums_the_parent_chain() {
        let mut arena = AnchorArena::new();
        let root = arena.create();
        let mid = arena.create();
        let leaf = arena.create();
        arena.set_parent(mid, root).expect("parent");
        arena.set_parent(leaf, mid).expect("parent");
        arena.move_to(root, 10.0, 20.0);
        arena.move_to(mid, 1.0, 2.0);
        arena.move_to(leaf, 0.5, -0.5);

        let global = arena.global_position(leaf);
        assert_eq!((global.x, global.y), (11.5, 21.5));
    }

    #[test]
    fn reparenting_into_a_descendant_is_rejected() {
        let mut arena = AnchorArena::new();
        let root = arena.create();
        let child = arena.create();
        arena.set_parent(child, root).expect("parent");

        assert_eq!(
            arena.set_parent(root, child),
            Err(AnchorError::WouldCycle {
                child: root,
                parent: child
            })
        );
        // The failed call must not have linked anything.
        assert_eq!(arena.global_position(root), arena.position(root));
    }

    #[test]
    fn self_parenting_is_a_cycle() {
        let mut arena = AnchorArena::new();
        let node = arena.create();
        assert!(arena.set_parent(node, node).is_err());
    }

    #[test]
    fn units_default_to_pixels_and_reject_zero() {
        let mut arena = AnchorArena::new();
        let node = arena.create();
        assert_eq!(arena.units(node), 1);
        arena.graticulate(node, 16);
        assert_eq!(arena.units(node), 16);
        arena.graticulate(node, 0);
        assert_eq!(arena.units(node), 1);
    }
}
