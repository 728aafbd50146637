// Library interface for kbchat-cli, so integration tests can reach the
// UI building blocks. main.rs declares the same files, hence `#[path]`.

#[path = "input.rs"]
pub mod input;

#[path = "render.rs"]
pub mod render;

#[path = "theme.rs"]
pub mod theme;

pub use input::InputLine;
pub use render::LiveReply;
pub use theme::Theme;
