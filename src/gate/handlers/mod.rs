//! API handlers: the thin proxy surface the hub's front-end talks to.
//!
//! All of them translate between the browser's first-party cookie jar and
//! the upstream identity service; none of them keep state.

pub mod health;
pub mod login;
pub mod logout;
pub mod refresh;
pub mod shell;
pub mod whoami;

pub use self::health::health;
pub use self::login::login;
pub use self::logout::logout;
pub use self::refresh::refresh;
pub use self::whoami::whoami;
