//! Local finance store: transactions, goals and calendar events for one
//! signed-in user, synchronized with a hosted backend or kept offline.

pub mod backend;
