mod adapter;
mod io;
mod mappings;

pub use adapter::LatestAdapter;
pub use io::LatestItemIo;
pub use mappings::{block_mapping, item_mapping, PROTOCOL_VERSION, VERSION};
