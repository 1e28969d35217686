// Adapters layer: concrete implementations of the domain ports (HTTP, browser).

pub mod browser;
pub mod http;
pub mod webdriver;

pub use browser::BrowserSlot;
pub use http::ReqwestFetcher;
pub use webdriver::{WebDriverLauncher, WebDriverSession};
