pub mod health;
pub mod sticker;
