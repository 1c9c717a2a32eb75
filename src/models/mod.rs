pub mod ack;
pub mod collection;
pub mod render;

pub use ack::*;
pub use collection::*;
pub use render::*;
