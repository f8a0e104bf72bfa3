mod live;
mod route;
mod vehicle;

pub use live::*;
pub use route::*;
pub use vehicle::*;
