pub mod rapidapi;
pub mod reliable;

pub mod mock;

pub use mock::{MockProvider, MockResponse};
pub use rapidapi::{RapidApiConfig, RapidApiProvider};
pub use reliable::{ReliableConfig, ReliableProvider};
