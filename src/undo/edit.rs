// UndoableEdit trait and the edit records the undo manager stores
//
// Every record holds the state to restore. Undoing one captures the current
// state of the same target first, which becomes the record for the opposite
// stack, and then applies itself.

use crate::undo::UndoResult;
use crate::undo::target::{FxSnapshot, ModSource, ModulationKey, OscillatorSnapshot, ParamValue, UndoTarget};

/// A reversible edit
///
/// # Example
/// ```no_run
/// use mymusic_patch_editor::undo::edit::{MacroChange, UndoableEdit};
/// use mymusic_patch_editor::undo::target::{SynthState, UndoTarget};
///
/// let mut state = SynthState::new(8);
/// let edit = MacroChange::new(0, 0.25);
///
/// // Remember what is there now, then restore the recorded value
/// let inverse = edit.capture_current(&state).unwrap();
/// edit.apply(&mut state).unwrap();
/// assert_eq!(state.macro_value(0).unwrap(), 0.25);
/// # let _ = inverse;
/// ```
pub trait UndoableEdit: Send {
    /// Record of the target's current state, used for the opposite stack
    fn capture_current(&self, target: &dyn UndoTarget) -> UndoResult<Box<dyn UndoableEdit>>;

    /// Restore the recorded state
    fn apply(&self, target: &mut dyn UndoTarget) -> UndoResult<()>;

    /// Human-readable description (e.g. "Undo: Parameter 12")
    fn description(&self) -> String;
}

/// Value of one parameter
pub struct ParameterChange {
    param_id: usize,
    value: ParamValue,
}

impl ParameterChange {
    pub fn new(param_id: usize, value: ParamValue) -> Self {
        Self { param_id, value }
    }
}

impl UndoableEdit for ParameterChange {
    fn capture_current(&self, target: &dyn UndoTarget) -> UndoResult<Box<dyn UndoableEdit>> {
        let value = target.parameter(self.param_id)?;
        Ok(Box::new(ParameterChange::new(self.param_id, value)))
    }

    fn apply(&self, target: &mut dyn UndoTarget) -> UndoResult<()> {
        target.set_parameter(self.param_id, self.value)
    }

    fn description(&self) -> String {
        format!("Parameter {} to {}", self.param_id, self.value)
    }
}

/// Value of one macro control
pub struct MacroChange {
    macro_id: usize,
    value: f32,
}

impl MacroChange {
    pub fn new(macro_id: usize, value: f32) -> Self {
        Self { macro_id, value }
    }
}

impl UndoableEdit for MacroChange {
    fn capture_current(&self, target: &dyn UndoTarget) -> UndoResult<Box<dyn UndoableEdit>> {
        let value = target.macro_value(self.macro_id)?;
        Ok(Box::new(MacroChange::new(self.macro_id, value)))
    }

    fn apply(&self, target: &mut dyn UndoTarget) -> UndoResult<()> {
        target.set_macro_value(self.macro_id, self.value)
    }

    fn description(&self) -> String {
        format!("Macro {} to {:.3}", self.macro_id + 1, self.value)
    }
}

/// Depth of one modulation routing
pub struct ModulationChange {
    key: ModulationKey,
    depth: f32,
}

impl ModulationChange {
    pub fn new(param_id: usize, source: ModSource, scene: usize, index: usize, depth: f32) -> Self {
        Self {
            key: ModulationKey {
                param_id,
                source,
                scene,
                index,
            },
            depth,
        }
    }
}

impl UndoableEdit for ModulationChange {
    fn capture_current(&self, target: &dyn UndoTarget) -> UndoResult<Box<dyn UndoableEdit>> {
        let depth = target.modulation(self.key)?;
        Ok(Box::new(ModulationChange {
            key: self.key,
            depth,
        }))
    }

    fn apply(&self, target: &mut dyn UndoTarget) -> UndoResult<()> {
        target.set_modulation(self.key, self.depth)
    }

    fn description(&self) -> String {
        format!(
            "Modulation {:?} -> parameter {} to {:.3}",
            self.key.source, self.key.param_id, self.depth
        )
    }
}

/// Whole oscillator (type and parameters)
pub struct OscillatorSwap {
    scene: usize,
    osc: usize,
    snapshot: OscillatorSnapshot,
}

impl OscillatorSwap {
    pub fn new(scene: usize, osc: usize, snapshot: OscillatorSnapshot) -> Self {
        Self { scene, osc, snapshot }
    }
}

impl UndoableEdit for OscillatorSwap {
    fn capture_current(&self, target: &dyn UndoTarget) -> UndoResult<Box<dyn UndoableEdit>> {
        let snapshot = target.oscillator(self.scene, self.osc)?;
        Ok(Box::new(OscillatorSwap::new(self.scene, self.osc, snapshot)))
    }

    fn apply(&self, target: &mut dyn UndoTarget) -> UndoResult<()> {
        target.set_oscillator(self.scene, self.osc, self.snapshot.clone())
    }

    fn description(&self) -> String {
        format!("Oscillator {} in scene {}", self.osc + 1, scene_name(self.scene))
    }
}

/// Whole FX slot (type and parameters)
pub struct FxSwap {
    slot: usize,
    snapshot: FxSnapshot,
}

impl FxSwap {
    pub fn new(slot: usize, snapshot: FxSnapshot) -> Self {
        Self { slot, snapshot }
    }
}

impl UndoableEdit for FxSwap {
    fn capture_current(&self, target: &dyn UndoTarget) -> UndoResult<Box<dyn UndoableEdit>> {
        let snapshot = target.fx(self.slot)?;
        Ok(Box::new(FxSwap::new(self.slot, snapshot)))
    }

    fn apply(&self, target: &mut dyn UndoTarget) -> UndoResult<()> {
        target.set_fx(self.slot, self.snapshot.clone())
    }

    fn description(&self) -> String {
        format!("FX slot {}", self.slot + 1)
    }
}

fn scene_name(scene: usize) -> char {
    match scene {
        0 => 'A',
        1 => 'B',
        _ => '?',
    }
}
