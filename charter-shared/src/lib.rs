pub mod envelope;
pub mod money;
pub mod pii;

pub use envelope::Envelope;
pub use money::format_minor;
pub use pii::Masked;
