//! Capability traits for the nodes of a mounted tree.
//!
//! A node is whatever implements the capabilities it has. The catalog root
//! has children; catalog entries have attributes. Ownership only flows
//! downward: the root owns its children and children never point back.

use crate::attr::AttributeView;

/// A node that can answer a stat-equivalent query.
pub trait HasAttributes {
    fn attributes(&self) -> AttributeView;
}

/// A node with named children.
pub trait HasChildren {
    type Child;

    /// Look up a direct child by its exact name.
    fn child(&self, name: &str) -> Option<&Self::Child>;

    /// Iterate direct children in insertion order.
    fn children(&self) -> Box<dyn Iterator<Item = (&str, &Self::Child)> + '_>;

    fn child_count(&self) -> usize;
}
