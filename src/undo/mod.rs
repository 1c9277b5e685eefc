// Undo/redo for editor edits
//
// Architecture:
// - UndoTarget trait: the synth state edits are read from and restored into
// - UndoableEdit trait: one reversible record (parameter, macro, modulation,
//   oscillator swap, FX swap)
// - UndoManager: undo/redo stacks, rebindable to a new editor instance
//
// Records store the state to restore, not a delta, so an undo captures the
// current state for redo before restoring.

pub mod edit;
pub mod manager;
pub mod target;

pub use manager::{SharedEditor, UndoManager};
pub use target::{ModSource, ParamValue, SynthState, UndoTarget};

/// Errors raised while applying an edit
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UndoError {
    #[error("Invalid parameter id {0}")]
    InvalidParameter(usize),

    #[error("Invalid macro {0}")]
    InvalidMacro(usize),

    #[error("Invalid scene {0}")]
    InvalidScene(usize),

    #[error("Invalid oscillator {0}")]
    InvalidOscillator(usize),

    #[error("Invalid FX slot {0}")]
    InvalidFxSlot(usize),

    #[error("Editor is unavailable")]
    EditorUnavailable,
}

pub type UndoResult<T> = Result<T, UndoError>;
