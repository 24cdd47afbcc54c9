//! Repository modules for database operations

pub mod history;
pub mod letters;
pub mod users;

pub use history::WorkflowHistoryRepository;
pub use letters::LetterRequestRepository;
pub use users::UserRepository;
