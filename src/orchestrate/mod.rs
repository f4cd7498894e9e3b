pub mod batch;
pub mod dispatcher;

pub use batch::RenderBatch;
pub use dispatcher::{DispatchSettings, Dispatcher};
