mod identity;
mod notify;
mod store;
mod util;

pub use identity::*;
pub use notify::*;
pub use store::*;
