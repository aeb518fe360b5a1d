//! Room codes, the room directory and the service sessions talk to

pub mod codes;
pub mod directory;
pub mod service;

pub use directory::RoomDirectory;
pub use service::RoomService;
