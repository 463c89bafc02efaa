pub mod download;
pub mod history;
pub mod retry;
pub mod util;
