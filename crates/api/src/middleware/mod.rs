//! Request extractors for the session identity.
//!
//! - [`session::Session`] -- the owner id from `x-owner-id`, or `"guest"`.
//! - [`session::RequireOwner`] -- a session that is not the guest.

pub mod session;
