//! Domain types and pure rules shared by the storage and HTTP layers.

pub mod model;
pub mod paging;
pub mod snowflake;
pub mod util;
pub mod validation;
pub mod visibility;
