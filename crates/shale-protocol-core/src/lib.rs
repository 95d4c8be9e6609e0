pub mod adapter;
pub mod chunk;
pub mod cipher;
pub mod codec;
pub mod io;
pub mod mapping;
pub mod metadata;
pub mod packets;
pub mod recipe;
pub mod session;
pub mod translator;
pub mod wire;

pub use adapter::*;
pub use cipher::*;
pub use codec::*;
pub use io::*;
pub use mapping::*;
pub use metadata::*;
pub use packets::*;
pub use recipe::*;
pub use session::*;
pub use translator::*;
pub use wire::*;
