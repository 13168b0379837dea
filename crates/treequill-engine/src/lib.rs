pub mod config;
pub mod dom;
pub mod editor;
pub mod error;
pub mod html;
pub mod range;

// Re-export key types for easier usage
pub use config::{Capabilities, EditorConfig};
pub use dom::{Category, DomTree, NodeData, NodeId};
pub use editor::{ChangeNotifier, ChangeSignal, Editor, Event, FormatDescriptor, ListKind};
pub use error::EngineError;
pub use range::{Boundary, Range};
