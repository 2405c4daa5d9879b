pub mod hashing;

mod virtual_path;
pub use virtual_path::VirtualPath;
pub use virtual_path::normalize_map_texture_base;

mod access;
pub use access::AccessLevel;

mod kind;
pub use kind::ResourceKind;
pub use kind::ResourceKindMask;
pub use kind::is_texture_container;
pub use kind::kind_for_entry_name;

mod game;
pub use game::GameFamily;

mod config;
pub use config::ResourceConfig;
