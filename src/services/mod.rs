pub mod activity;
pub mod api;
pub mod auth;
pub mod backend;
pub mod mock;
pub mod poller;
pub mod scans;
pub mod session;
pub mod settings;
pub mod storage;

pub use activity::ActivityFeed;
pub use api::ApiClient;
pub use auth::AuthService;
pub use backend::ScanBackend;
pub use mock::MockBackend;
pub use poller::{PollHandle, PollSnapshot, PollState, ScanPoller};
pub use scans::{ScanService, ScanSource};
pub use session::{Session, SessionStore};
pub use settings::SettingsStore;
pub use storage::BlobStorage;
