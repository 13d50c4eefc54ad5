pub mod auth;
pub mod error;
pub mod fish;
pub mod flies;
pub mod mail;
pub mod middleware;
pub mod objects;
pub mod profiles;
pub mod rivers;
pub mod schema;
pub mod state;
pub mod tackle;
pub mod text;
pub mod trips;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support;
