pub mod feed;
pub mod genres;
pub mod providers;
pub mod recommendations;
pub mod search;
pub mod watch_history;
pub mod watched;
