use crate::auth::repo::{SessionRepo, UserRepo};
use crate::journal::repo::EntryRepo;

/// Everything the handlers need from persistence.
pub trait Store: UserRepo + SessionRepo + EntryRepo {}

impl<T> Store for T where T: UserRepo + SessionRepo + EntryRepo {}
