//! Domain models shared across crates.

mod account;
mod image;
mod token;

pub use account::{Account, AccountInfo};
pub use image::{Batch, Image, ImageResponse, ResolvedImage};
pub use token::AccessToken;
