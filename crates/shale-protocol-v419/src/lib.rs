mod adapter;
mod downgrader;
mod io;
mod mappings;
mod upgrader;

pub use adapter::Protocol419;
pub use io::LegacyItemIo;
pub use mappings::{block_mapping, item_mapping, PROTOCOL_VERSION, VERSION};
