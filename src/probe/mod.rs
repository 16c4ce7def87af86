// Probe module - collaborator traits and probe outcomes
pub mod traits;

pub use traits::{
    ConnectionProvider,
    ProbeOutcome,
    ProtocolSession,
    SessionFactory,
};
