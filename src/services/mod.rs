pub mod browser_client;
pub mod credential_store;
pub mod history_store;
pub mod quiz_client;
pub mod result_writer;
pub mod schedule_store;

pub use browser_client::BrowserClient;
pub use credential_store::{AccountConfig, CredentialStore};
pub use history_store::HistoryStore;
pub use quiz_client::{QuizClient, SubmitOutcome};
pub use result_writer::ResultWriter;
pub use schedule_store::ScheduleStore;
