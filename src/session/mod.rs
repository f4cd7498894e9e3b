pub mod dto;
pub mod lc_session;
pub mod urls;

pub use dto::*;
pub use lc_session::LcSession;
pub use urls::*;
