pub mod adapter;
pub mod dispatcher;
pub mod pattern;
pub mod request;
pub mod table;

pub use adapter::serve;
pub use dispatcher::{Dispatcher, Flow, Handler, Intercept, Reply};
pub use pattern::{PatternError, RoutePattern};
pub use request::ApiRequest;
pub use table::{Route, RouteTable};
