pub mod coordinator;
pub mod database;
pub mod document;
pub mod error;
pub mod events;
pub mod filemanager;
pub mod lrc;
pub mod lyrics;
pub mod music;
pub mod providers;
pub mod settings;
pub mod util;

mod sql;
