#![forbid(unsafe_code)]

//! Identities and descriptors for draggables and droppables.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create an id from anything string-like.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the id as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Unique identity of a draggable item.
    DraggableId
);
string_id!(
    /// Unique identity of a droppable container.
    DroppableId
);
string_id!(
    /// Grouping key: draggables only move between droppables of the same type.
    TypeId
);

impl Default for TypeId {
    fn default() -> Self {
        Self::new("DEFAULT")
    }
}

/// Identity and current logical position of a draggable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DraggableDescriptor {
    pub id: DraggableId,
    /// Position within the owning droppable. Dense after publication.
    pub index: usize,
    pub droppable_id: DroppableId,
    pub type_id: TypeId,
}

impl DraggableDescriptor {
    pub fn new(
        id: impl Into<DraggableId>,
        index: usize,
        droppable_id: impl Into<DroppableId>,
        type_id: impl Into<TypeId>,
    ) -> Self {
        Self {
            id: id.into(),
            index,
            droppable_id: droppable_id.into(),
            type_id: type_id.into(),
        }
    }
}

/// Identity of a droppable container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DroppableDescriptor {
    pub id: DroppableId,
    pub type_id: TypeId,
}

impl DroppableDescriptor {
    pub fn new(id: impl Into<DroppableId>, type_id: impl Into<TypeId>) -> Self {
        Self {
            id: id.into(),
            type_id: type_id.into(),
        }
    }
}
