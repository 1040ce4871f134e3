pub mod bookmark_source;
pub mod config;
pub mod contract;
pub mod corpus;
pub mod cursor;
pub mod intent;
pub mod logging;
pub mod model;
pub mod navigation;
pub mod oracle;
pub mod presenter;
pub mod runtime;
pub mod search;
pub mod session;
pub mod transport;
