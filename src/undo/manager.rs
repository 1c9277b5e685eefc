// UndoManager - undo/redo stacks for editor edits

use crate::undo::edit::{
    FxSwap, MacroChange, ModulationChange, OscillatorSwap, ParameterChange, UndoableEdit,
};
use crate::undo::target::{ModSource, ParamValue, UndoTarget};
use crate::undo::{UndoError, UndoResult};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Default maximum number of edits to keep in history
const DEFAULT_MAX_HISTORY: usize = 100;

/// Editor handle shared between the editor UI and the undo manager
pub type SharedEditor = Arc<Mutex<dyn UndoTarget + Send>>;

/// Records edits and replays them backwards / forwards
///
/// Push calls record the value an edit is about to overwrite. `undo()` pops
/// the latest record, stores the current state of the same target on the redo
/// stack and restores the record; `redo()` is the mirror image.
///
/// A new push clears the redo stack. The undo stack is bounded, the oldest
/// record is dropped when the limit is reached.
pub struct UndoManager {
    editor: SharedEditor,

    /// Most recent at the back
    undo_stack: VecDeque<Box<dyn UndoableEdit>>,

    /// Most recent at the back
    redo_stack: VecDeque<Box<dyn UndoableEdit>>,

    max_history: usize,
}

impl UndoManager {
    pub fn new(editor: SharedEditor) -> Self {
        Self::with_capacity(editor, DEFAULT_MAX_HISTORY)
    }

    pub fn with_capacity(editor: SharedEditor, max_history: usize) -> Self {
        Self {
            editor,
            undo_stack: VecDeque::with_capacity(max_history),
            redo_stack: VecDeque::with_capacity(max_history),
            max_history: max_history.max(1),
        }
    }

    /// Rebind to a new editor instance, keeping the history
    pub fn reset_editor(&mut self, editor: SharedEditor) {
        log::debug!(
            "Undo manager rebound to new editor ({} undo, {} redo)",
            self.undo_stack.len(),
            self.redo_stack.len()
        );
        self.editor = editor;
    }

    /// Record the value `param_id` had before the edit
    pub fn push_parameter_change(&mut self, param_id: usize, value: ParamValue) {
        self.push(Box::new(ParameterChange::new(param_id, value)));
    }

    pub fn push_macro_change(&mut self, macro_id: usize, value: f32) {
        self.push(Box::new(MacroChange::new(macro_id, value)));
    }

    pub fn push_modulation_change(
        &mut self,
        param_id: usize,
        source: ModSource,
        scene: usize,
        index: usize,
        depth: f32,
    ) {
        self.push(Box::new(ModulationChange::new(
            param_id, source, scene, index, depth,
        )));
    }

    /// Snapshot an oscillator before it is swapped
    pub fn push_oscillator(&mut self, scene: usize, osc: usize) {
        match self.with_editor(|editor| editor.oscillator(scene, osc)) {
            Ok(snapshot) => self.push(Box::new(OscillatorSwap::new(scene, osc, snapshot))),
            Err(e) => log::warn!("Not recording oscillator swap: {}", e),
        }
    }

    /// Snapshot an FX slot before it is swapped
    pub fn push_fx(&mut self, slot: usize) {
        match self.with_editor(|editor| editor.fx(slot)) {
            Ok(snapshot) => self.push(Box::new(FxSwap::new(slot, snapshot))),
            Err(e) => log::warn!("Not recording FX swap: {}", e),
        }
    }

    fn push(&mut self, edit: Box<dyn UndoableEdit>) {
        self.undo_stack.push_back(edit);

        // New timeline
        self.redo_stack.clear();

        if self.undo_stack.len() > self.max_history {
            self.undo_stack.pop_front();
        }
    }

    fn with_editor<T>(
        &self,
        f: impl FnOnce(&mut (dyn UndoTarget + Send)) -> UndoResult<T>,
    ) -> UndoResult<T> {
        let mut editor = self.editor.lock().map_err(|_| UndoError::EditorUnavailable)?;
        f(&mut *editor)
    }

    /// Capture the current state for `edit`'s target, then apply `edit`
    fn swap(&self, edit: &dyn UndoableEdit) -> UndoResult<Box<dyn UndoableEdit>> {
        self.with_editor(|editor| {
            let inverse = edit.capture_current(&*editor)?;
            edit.apply(editor)?;
            Ok(inverse)
        })
    }

    /// Undo the last edit; false if there is nothing to undo or it failed
    pub fn undo(&mut self) -> bool {
        let Some(edit) = self.undo_stack.pop_back() else {
            return false;
        };

        match self.swap(edit.as_ref()) {
            Ok(inverse) => {
                log::debug!("Undo: {}", edit.description());
                self.redo_stack.push_back(inverse);
                if self.redo_stack.len() > self.max_history {
                    self.redo_stack.pop_front();
                }
                true
            }
            Err(e) => {
                log::warn!("Undo of '{}' failed: {}", edit.description(), e);
                false
            }
        }
    }

    /// Redo the last undone edit; false if there is nothing to redo or it failed
    pub fn redo(&mut self) -> bool {
        let Some(edit) = self.redo_stack.pop_back() else {
            return false;
        };

        match self.swap(edit.as_ref()) {
            Ok(inverse) => {
                log::debug!("Redo: {}", edit.description());
                self.undo_stack.push_back(inverse);
                if self.undo_stack.len() > self.max_history {
                    self.undo_stack.pop_front();
                }
                true
            }
            Err(e) => {
                log::warn!("Redo of '{}' failed: {}", edit.description(), e);
                false
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.back().map(|edit| edit.description())
    }

    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack.back().map(|edit| edit.description())
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Log both stacks, most recent first
    pub fn dump_stack(&self) {
        log::debug!("Undo stack ({} entries):", self.undo_stack.len());
        for (i, edit) in self.undo_stack.iter().rev().enumerate() {
            log::debug!("  [{}] {}", i, edit.description());
        }
        log::debug!("Redo stack ({} entries):", self.redo_stack.len());
        for (i, edit) in self.redo_stack.iter().rev().enumerate() {
            log::debug!("  [{}] {}", i, edit.description());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::undo::target::{FxSnapshot, ModulationKey, OscillatorSnapshot, SynthState};

    fn create_editor() -> (Arc<Mutex<SynthState>>, SharedEditor) {
        let state = Arc::new(Mutex::new(SynthState::new(16)));
        let editor: SharedEditor = state.clone();
        (state, editor)
    }

    #[test]
    fn test_parameter_undo_redo_round_trip() {
        let (state, editor) = create_editor();
        let mut manager = UndoManager::new(editor);

        // User drags parameter 3 from 0.0 to 0.7
        manager.push_parameter_change(3, ParamValue::Float(0.0));
        state.lock().unwrap().set_parameter(3, ParamValue::Float(0.7)).unwrap();

        assert!(manager.undo());
        assert_eq!(state.lock().unwrap().parameter(3).unwrap(), ParamValue::Float(0.0));
        assert_eq!(manager.redo_count(), 1);

        assert!(manager.redo());
        assert_eq!(state.lock().unwrap().parameter(3).unwrap(), ParamValue::Float(0.7));
        assert_eq!(manager.undo_count(), 1);
    }

    #[test]
    fn test_macro_and_modulation_round_trip() {
        let (state, editor) = create_editor();
        let mut manager = UndoManager::new(editor);

        manager.push_macro_change(2, 0.0);
        state.lock().unwrap().set_macro_value(2, 0.9).unwrap();

        manager.push_modulation_change(5, ModSource::VoiceLfo(0), 0, 0, 0.0);
        let key = ModulationKey {
            param_id: 5,
            source: ModSource::VoiceLfo(0),
            scene: 0,
            index: 0,
        };
        state.lock().unwrap().set_modulation(key, 0.4).unwrap();

        assert!(manager.undo());
        assert_eq!(state.lock().unwrap().modulation(key).unwrap(), 0.0);
        assert!(manager.undo());
        assert_eq!(state.lock().unwrap().macro_value(2).unwrap(), 0.0);

        assert!(manager.redo());
        assert_eq!(state.lock().unwrap().macro_value(2).unwrap(), 0.9);
        assert!(manager.redo());
        assert_eq!(state.lock().unwrap().modulation(key).unwrap(), 0.4);
    }

    #[test]
    fn test_oscillator_and_fx_snapshots() {
        let (state, editor) = create_editor();
        let mut manager = UndoManager::new(editor);

        manager.push_oscillator(0, 1);
        state.lock().unwrap().oscillators[0][1] = OscillatorSnapshot {
            osc_type: 4,
            params: vec![ParamValue::Int(2)],
        };

        manager.push_fx(3);
        state.lock().unwrap().fx[3] = FxSnapshot {
            fx_type: 7,
            params: vec![0.5, 0.25],
        };

        assert!(manager.undo());
        assert_eq!(state.lock().unwrap().fx[3], FxSnapshot::default());
        assert!(manager.undo());
        assert_eq!(state.lock().unwrap().oscillators[0][1], OscillatorSnapshot::default());

        assert!(manager.redo());
        assert_eq!(state.lock().unwrap().oscillators[0][1].osc_type, 4);
    }

    #[test]
    fn test_push_clears_redo_stack() {
        let (_state, editor) = create_editor();
        let mut manager = UndoManager::new(editor);

        manager.push_macro_change(0, 0.1);
        assert!(manager.undo());
        assert!(manager.can_redo());

        manager.push_macro_change(0, 0.2);
        assert!(!manager.can_redo());
        assert_eq!(manager.redo_count(), 0);
    }

    #[test]
    fn test_history_limit() {
        let (_state, editor) = create_editor();
        let mut manager = UndoManager::with_capacity(editor, 3);

        for i in 0..5 {
            manager.push_macro_change(0, i as f32);
        }

        assert_eq!(manager.undo_count(), 3);
    }

    #[test]
    fn test_empty_stacks_return_false() {
        let (_state, editor) = create_editor();
        let mut manager = UndoManager::new(editor);

        assert!(!manager.undo());
        assert!(!manager.redo());
    }

    #[test]
    fn test_failed_undo_discards_record() {
        let (_state, editor) = create_editor();
        let mut manager = UndoManager::new(editor);

        manager.push_parameter_change(999, ParamValue::Int(1));
        assert!(!manager.undo());
        assert!(!manager.can_undo());
        assert!(!manager.can_redo());
    }

    #[test]
    fn test_reset_editor_keeps_history() {
        let (_old_state, old_editor) = create_editor();
        let mut manager = UndoManager::new(old_editor);
        manager.push_macro_change(1, 0.3);

        let (new_state, new_editor) = create_editor();
        new_state.lock().unwrap().set_macro_value(1, 0.8).unwrap();
        manager.reset_editor(new_editor);

        assert_eq!(manager.undo_count(), 1);
        assert!(manager.undo());
        assert_eq!(new_state.lock().unwrap().macro_value(1).unwrap(), 0.3);
    }

    #[test]
    fn test_descriptions() {
        let (_state, editor) = create_editor();
        let mut manager = UndoManager::new(editor);

        manager.push_macro_change(0, 0.5);
        assert_eq!(manager.undo_description().as_deref(), Some("Macro 1 to 0.500"));
        assert_eq!(manager.redo_description(), None);
    }
}
