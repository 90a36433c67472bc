pub mod chat;
pub mod events;
pub mod i18n;
pub mod request;
pub mod results;
