pub mod application;
pub mod message;
pub mod widgets;

// Display surfaces
pub mod menubar;
pub mod overlay;
pub mod tray;
