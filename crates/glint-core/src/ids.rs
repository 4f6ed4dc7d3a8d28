//! Process-unique identities for runtime objects.
//!
//! Identity is what caches key on (a material variant is cached per base
//! material, a merged geometry per list of input geometries), so every
//! constructed object draws a fresh id while plain `Clone` preserves it.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_raw() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);

        impl $name {
            pub fn next() -> Self {
                $name(next_raw())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "-{}"), self.0)
            }
        }
    };
}

define_id!(
    /// Identity of a scene object (node, mesh, camera, light, bone).
    ObjectId,
    "object"
);
define_id!(
    /// Identity of a material.
    MaterialId,
    "material"
);
define_id!(
    /// Identity of a geometry.
    GeometryId,
    "geometry"
);
define_id!(BufferId, "buffer");
define_id!(TextureId, "texture");
