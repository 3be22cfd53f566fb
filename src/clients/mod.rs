//! HTTP collaborators: address geocoding, company registry and mail.

pub mod cvr;
pub mod geocode;
pub mod mail;
