//! Testing utilities and harness for Huerto

pub mod testing;

pub use testing::*;

pub mod prelude {
    pub use crate::testing::*;
    pub use huerto_core::{h, Attributes, Event, MemoryTarget, NodeId, VNode};
}
