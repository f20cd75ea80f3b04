pub mod builder;
pub mod event;
pub mod interact;
pub mod registry;
pub mod sequence;
pub mod step;
pub mod world;
