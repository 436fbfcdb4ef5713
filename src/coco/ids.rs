//! Newtype IDs for COCO records.
//!
//! Image, annotation and category ids share the same `u64` wire type in COCO
//! JSON. Keeping them apart at the type level means an id remap built for
//! images cannot be applied to categories by mistake.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! coco_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            #[inline]
            pub fn new(id: u64) -> Self {
                Self(id)
            }

            #[inline]
            pub fn as_u64(&self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

coco_id!(
    /// Identifier of an image record.
    ImageId
);

coco_id!(
    /// Identifier of an annotation record.
    AnnotationId
);

coco_id!(
    /// Identifier of a category record.
    CategoryId
);

/// Hands out dense ids starting from a fixed base.
#[derive(Clone, Debug)]
pub(crate) struct DenseIds {
    next: u64,
}

impl DenseIds {
    pub(crate) fn starting_at(base: u64) -> Self {
        Self { next: base }
    }

    pub(crate) fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_compare_by_value() {
        assert_eq!(ImageId(1), ImageId::new(1));
        assert!(CategoryId(2) < CategoryId(10));
        assert_eq!(format!("{:?}", AnnotationId(7)), "AnnotationId(7)");
        assert_eq!(AnnotationId(7).to_string(), "7");
    }

    #[test]
    fn ids_serialize_as_plain_integers() {
        let json = serde_json::to_string(&vec![ImageId(3), ImageId(4)]).unwrap();
        assert_eq!(json, "[3,4]");
        let back: CategoryId = serde_json::from_str("12").unwrap();
        assert_eq!(back, CategoryId(12));
    }

    #[test]
    fn dense_ids_are_contiguous_from_base() {
        let mut ids = DenseIds::starting_at(1);
        let got: Vec<u64> = (0..4).map(|_| ids.next_id()).collect();
        assert_eq!(got, vec![1, 2, 3, 4]);

        let mut zero_based = DenseIds::starting_at(0);
        assert_eq!(zero_based.next_id(), 0);
    }
}
