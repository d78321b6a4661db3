/**
 * Identifies which bucket a mount session enumerates
 *  and, optionally, where it lives.
 */
pub mod bucket;
/**
 * The frozen, flat tree built from a single bucket
 *  listing, plus the builder that produces it.
 */
pub mod catalog;
/**
 * Capability traits shared by the nodes of the
 *  mounted tree (attributes, children).
 */
pub mod node;
/**
 * Storage-facing side of the catalog: the lister trait
 *  and its object_store backed implementation.
 */
pub mod listing;
/**
 * Projection of catalog entries onto filesystem
 *  attribute records.
 */
pub mod attr;

pub mod prelude {
    pub use crate::attr::{attributes_of, AttributeView, FILE_MODE};
    pub use crate::bucket::{BucketRef, BucketRefError};
    pub use crate::catalog::{Catalog, CatalogBuilder, CatalogEntry, CatalogError, ListingPolicy};
    pub use crate::listing::{ListedObject, ListingError, ObjectLister, S3Lister, StoreLister};
    pub use crate::node::{HasAttributes, HasChildren};
}
