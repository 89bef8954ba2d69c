//! # Allstar Gate
//!
//! An edge authentication gate for the Allstar hub. The identity service of
//! record lives on a separate origin; this service decides which inbound
//! requests require a verified identity, verifies that identity upstream,
//! transparently refreshes an expired access credential at most once per
//! request, and re-issues upstream-minted tokens as cookies scoped to the
//! serving origin.
//!
//! No session state is persisted server-side: everything needed to
//! re-authenticate lives in the client's cookie jar.

pub mod cli;
pub mod gate;
