pub mod document;
pub mod error;
pub mod links;
pub mod prober;
pub mod result;

pub use document::{FetchedPage, PageDocument, fetch_page};
pub use error::ScanError;
pub use links::classify_links;
pub use prober::{ProbeCallback, Prober, build_client};
pub use result::{LinkSet, ProbeOutcome, ReachabilityReport};
