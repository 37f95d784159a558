// Shared domain types, used by both the engine layer and the UI layer.
// Neither layer depends on the other; both import from this module.

pub mod common;
pub mod pr;
pub mod session;
pub mod view;

pub use common::*;
pub use pr::*;
pub use session::*;
pub use view::*;
