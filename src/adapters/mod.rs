//! Adapters connecting the session ports to browsers, web pages and files.

pub mod csv_store;
pub mod http_fetcher;
pub mod mock;
pub mod webdriver;

pub use csv_store::CsvLedgerStore;
pub use http_fetcher::HttpPageFetcher;
pub use mock::{MemoryLedgerStore, MockRound, MockSlotMachine, StaticPageFetcher};
pub use webdriver::{BrowserOptions, WebDriverClient};
