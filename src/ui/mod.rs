pub mod listen_button;

pub use listen_button::{ButtonAction, ButtonIcon, ListenButtonView};
