//! Auth-domain identifiers, scope sets, secrets, and the values carried through a login.

pub mod grant;
pub mod id;
pub mod scope;
pub mod secret;
pub mod state;

pub use grant::*;
pub use id::*;
pub use scope::*;
pub use secret::*;
pub use state::*;
