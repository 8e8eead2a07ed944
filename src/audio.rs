//! Audio system using Web Audio API
//!
//! Collision tones are synthesized from the active variation's
//! `SoundProfile`; no sample files are loaded.

use glam::Vec2;
use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

use crate::history::RoundRecord;
use crate::sim::{SimListener, SoundProfile, TypeId, Waveform};

/// Peak gain of a single tone before master volume
const TONE_PEAK: f32 = 0.3;
/// Output scale applied on top of the user's volume
const MASTER_SCALE: f32 = 0.3;
/// Tones started per frame; busy frames drop the rest
const MAX_VOICES_PER_FRAME: u32 = 4;

fn osc_type(waveform: Waveform) -> OscillatorType {
    match waveform {
        Waveform::Sine => OscillatorType::Sine,
        Waveform::Triangle => OscillatorType::Triangle,
        Waveform::Square => OscillatorType::Square,
        Waveform::Sawtooth => OscillatorType::Sawtooth,
    }
}

/// Plays transform and tie tones for the running simulation
pub struct AudioManager {
    ctx: Option<AudioContext>,
    master_volume: f32,
    muted: bool,
    profile: SoundProfile,
    type_count: usize,
    voices_this_frame: u32,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioManager {
    pub fn new() -> Self {
        // Try to create audio context (may fail if not in secure context)
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            master_volume: 0.8,
            muted: false,
            profile: SoundProfile::default(),
            type_count: 3,
            voices_this_frame: 0,
        }
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Call once per animation frame before dispatching events
    pub fn begin_frame(&mut self) {
        self.voices_this_frame = 0;
    }

    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * MASTER_SCALE
        }
    }

    fn play_tone(&mut self, freq: f32, waveform: Waveform) {
        let vol = self.effective_volume();
        if vol <= 0.0 || self.voices_this_frame >= MAX_VOICES_PER_FRAME {
            return;
        }
        let Some(ctx) = &self.ctx else { return };

        // Resume context if suspended (browsers require user gesture)
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        let Some((osc, gain)) = create_osc(ctx, freq, osc_type(waveform)) else {
            return;
        };
        let t = ctx.current_time();
        let attack = self.profile.attack_secs as f64;
        let end = t + self.profile.duration_secs() as f64;

        // Linear attack, exponential release
        gain.gain().set_value_at_time(0.0, t).ok();
        gain.gain()
            .linear_ramp_to_value_at_time(vol * TONE_PEAK, t + attack)
            .ok();
        gain.gain().exponential_ramp_to_value_at_time(0.001, end).ok();

        osc.start().ok();
        osc.stop_with_when(end).ok();
        self.voices_this_frame += 1;
    }
}

/// Create an oscillator with gain envelope
fn create_osc(
    ctx: &AudioContext,
    freq: f32,
    osc_type: OscillatorType,
) -> Option<(OscillatorNode, GainNode)> {
    let osc = ctx.create_oscillator().ok()?;
    let gain = ctx.create_gain().ok()?;

    osc.set_type(osc_type);
    osc.frequency().set_value(freq);
    osc.connect_with_audio_node(&gain).ok()?;
    gain.connect_with_audio_node(&ctx.destination()).ok()?;

    Some((osc, gain))
}

impl SimListener for AudioManager {
    fn on_round_start(
        &mut self,
        _round: u32,
        _variation: &str,
        type_count: usize,
        sound: &SoundProfile,
    ) {
        self.profile = *sound;
        self.type_count = type_count;
    }

    fn on_transform(&mut self, from: TypeId, to: TypeId, _at: Vec2) {
        let freq = self.profile.transform_frequency(from, to, self.type_count);
        self.play_tone(freq, self.profile.waveform);
    }

    fn on_tie(&mut self, _a: TypeId, _b: TypeId, _at: Vec2) {
        self.play_tone(self.profile.tie_frequency(), self.profile.tie_waveform());
    }

    fn on_round_end(&mut self, record: &RoundRecord) {
        log::debug!("Round {} over, {} wins", record.round_number, record.winner_label);
    }
}
