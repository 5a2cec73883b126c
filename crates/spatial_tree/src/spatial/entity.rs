//! Entities indexed by a spatial tree

use slotmap::new_key_type;

use crate::foundation::math::VecN;
use crate::spatial::node::NodeKey;

new_key_type! {
    /// Stable handle to an entity slot inside a tree
    pub struct EntityKey;
}

/// Named point stored in a spatial tree
///
/// Owned by the tree. Nodes only refer to entities through their
/// [`EntityKey`], and the entity points back at the leaf that indexes it.
#[derive(Debug, Clone)]
pub struct TreeEntity<const D: usize, P> {
    name: String,
    pub(crate) position: VecN<D>,
    pub(crate) owner: NodeKey,
    tag: i32,
    payload: P,
}

impl<const D: usize, P> TreeEntity<D, P> {
    pub(crate) fn new(name: String, position: VecN<D>, tag: i32, payload: P) -> Self {
        Self {
            name,
            position,
            owner: NodeKey::default(),
            tag,
            payload,
        }
    }

    /// Unique name of the entity
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current position
    pub fn position(&self) -> VecN<D> {
        self.position
    }

    /// User tag supplied at insertion
    pub fn tag(&self) -> i32 {
        self.tag
    }

    /// User payload supplied at insertion
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Mutable access to the user payload
    pub fn payload_mut(&mut self) -> &mut P {
        &mut self.payload
    }

    /// Consume the entity, returning its payload
    pub fn into_payload(self) -> P {
        self.payload
    }

    /// Key of the leaf node currently indexing this entity
    pub fn owner(&self) -> NodeKey {
        self.owner
    }
}
