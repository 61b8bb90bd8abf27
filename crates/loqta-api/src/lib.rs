pub mod auth;
pub mod claims;
pub mod convert;
pub mod emails;
pub mod error;
pub mod images;
pub mod items;
pub mod middleware;
pub mod notifications;
pub mod profiles;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_support;
