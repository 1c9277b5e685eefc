// UndoTarget - the synth state undo/redo reads from and writes to
//
// The editor owns the real synthesizer; the undo manager only sees it through
// this trait. `SynthState` is an in-memory implementation used by the
// standalone editor and the tests.

use crate::undo::{UndoError, UndoResult};
use std::collections::HashMap;

pub const N_SCENES: usize = 2;
pub const N_OSCS: usize = 3;
pub const N_MACROS: usize = 8;
pub const N_FX_SLOTS: usize = 16;

/// Value of one synth parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Int(i32),
    Bool(bool),
    Float(f32),
}

impl Default for ParamValue {
    fn default() -> Self {
        ParamValue::Float(0.0)
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{:.3}", v),
        }
    }
}

/// Modulation sources that can be routed to a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModSource {
    Velocity,
    Keytrack,
    ModWheel,
    Aftertouch,
    PitchBend,
    Macro(u8),
    VoiceLfo(u8),
    SceneLfo(u8),
    AmpEnvelope,
    FilterEnvelope,
}

/// Identifies one modulation routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModulationKey {
    pub param_id: usize,
    pub source: ModSource,
    pub scene: usize,
    pub index: usize,
}

/// Complete state of one oscillator
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OscillatorSnapshot {
    pub osc_type: u32,
    pub params: Vec<ParamValue>,
}

/// Complete state of one FX slot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FxSnapshot {
    pub fx_type: u32,
    pub params: Vec<f32>,
}

/// Editor collaborator of the undo manager
pub trait UndoTarget {
    fn parameter(&self, param_id: usize) -> UndoResult<ParamValue>;
    fn set_parameter(&mut self, param_id: usize, value: ParamValue) -> UndoResult<()>;

    fn macro_value(&self, macro_id: usize) -> UndoResult<f32>;
    fn set_macro_value(&mut self, macro_id: usize, value: f32) -> UndoResult<()>;

    /// Depth of a routing, 0.0 when unrouted
    fn modulation(&self, key: ModulationKey) -> UndoResult<f32>;
    fn set_modulation(&mut self, key: ModulationKey, depth: f32) -> UndoResult<()>;

    fn oscillator(&self, scene: usize, osc: usize) -> UndoResult<OscillatorSnapshot>;
    fn set_oscillator(&mut self, scene: usize, osc: usize, snapshot: OscillatorSnapshot) -> UndoResult<()>;

    fn fx(&self, slot: usize) -> UndoResult<FxSnapshot>;
    fn set_fx(&mut self, slot: usize, snapshot: FxSnapshot) -> UndoResult<()>;
}

/// In-memory synth state
#[derive(Debug, Clone)]
pub struct SynthState {
    pub params: Vec<ParamValue>,
    pub macros: [f32; N_MACROS],
    pub modulation: HashMap<ModulationKey, f32>,
    pub oscillators: [[OscillatorSnapshot; N_OSCS]; N_SCENES],
    pub fx: Vec<FxSnapshot>,
}

impl SynthState {
    pub fn new(param_count: usize) -> Self {
        Self {
            params: vec![ParamValue::default(); param_count],
            macros: [0.0; N_MACROS],
            modulation: HashMap::new(),
            oscillators: Default::default(),
            fx: vec![FxSnapshot::default(); N_FX_SLOTS],
        }
    }

    fn check_scene_osc(scene: usize, osc: usize) -> UndoResult<()> {
        if scene >= N_SCENES {
            return Err(UndoError::InvalidScene(scene));
        }
        if osc >= N_OSCS {
            return Err(UndoError::InvalidOscillator(osc));
        }
        Ok(())
    }
}

impl UndoTarget for SynthState {
    fn parameter(&self, param_id: usize) -> UndoResult<ParamValue> {
        self.params
            .get(param_id)
            .copied()
            .ok_or(UndoError::InvalidParameter(param_id))
    }

    fn set_parameter(&mut self, param_id: usize, value: ParamValue) -> UndoResult<()> {
        let slot = self
            .params
            .get_mut(param_id)
            .ok_or(UndoError::InvalidParameter(param_id))?;
        *slot = value;
        Ok(())
    }

    fn macro_value(&self, macro_id: usize) -> UndoResult<f32> {
        self.macros
            .get(macro_id)
            .copied()
            .ok_or(UndoError::InvalidMacro(macro_id))
    }

    fn set_macro_value(&mut self, macro_id: usize, value: f32) -> UndoResult<()> {
        let slot = self
            .macros
            .get_mut(macro_id)
            .ok_or(UndoError::InvalidMacro(macro_id))?;
        *slot = value;
        Ok(())
    }

    fn modulation(&self, key: ModulationKey) -> UndoResult<f32> {
        if key.param_id >= self.params.len() {
            return Err(UndoError::InvalidParameter(key.param_id));
        }
        Ok(self.modulation.get(&key).copied().unwrap_or(0.0))
    }

    fn set_modulation(&mut self, key: ModulationKey, depth: f32) -> UndoResult<()> {
        if key.param_id >= self.params.len() {
            return Err(UndoError::InvalidParameter(key.param_id));
        }
        if depth == 0.0 {
            self.modulation.remove(&key);
        } else {
            self.modulation.insert(key, depth);
        }
        Ok(())
    }

    fn oscillator(&self, scene: usize, osc: usize) -> UndoResult<OscillatorSnapshot> {
        Self::check_scene_osc(scene, osc)?;
        Ok(self.oscillators[scene][osc].clone())
    }

    fn set_oscillator(&mut self, scene: usize, osc: usize, snapshot: OscillatorSnapshot) -> UndoResult<()> {
        Self::check_scene_osc(scene, osc)?;
        self.oscillators[scene][osc] = snapshot;
        Ok(())
    }

    fn fx(&self, slot: usize) -> UndoResult<FxSnapshot> {
        self.fx.get(slot).cloned().ok_or(UndoError::InvalidFxSlot(slot))
    }

    fn set_fx(&mut self, slot: usize, snapshot: FxSnapshot) -> UndoResult<()> {
        let entry = self.fx.get_mut(slot).ok_or(UndoError::InvalidFxSlot(slot))?;
        *entry = snapshot;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_access_fails() {
        let mut state = SynthState::new(4);

        assert!(state.parameter(4).is_err());
        assert!(state.set_macro_value(N_MACROS, 1.0).is_err());
        assert!(state.oscillator(N_SCENES, 0).is_err());
        assert!(state.set_fx(N_FX_SLOTS, FxSnapshot::default()).is_err());
    }

    #[test]
    fn test_zero_depth_removes_routing() {
        let mut state = SynthState::new(4);
        let key = ModulationKey {
            param_id: 1,
            source: ModSource::Macro(0),
            scene: 0,
            index: 0,
        };

        state.set_modulation(key, 0.5).unwrap();
        assert_eq!(state.modulation.len(), 1);

        state.set_modulation(key, 0.0).unwrap();
        assert!(state.modulation.is_empty());
        assert_eq!(state.modulation(key).unwrap(), 0.0);
    }
}
