//! Layer buses and the intensity-driven mix projection.
//!
//! Each instrument role has one persistent bus. Bus gains are a pure function
//! of the current intensity and the music volume; they are recomputed every
//! tick and never accumulated.

/// Instrument role, one per mix bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Kick,
    HiHat,
    Snare,
    Bass,
    Pad,
    Arp,
    Lead,
}

impl Layer {
    /// Number of layer buses.
    pub const COUNT: usize = 7;

    /// Every layer, in bus order.
    pub const ALL: [Layer; Layer::COUNT] = [
        Layer::Kick,
        Layer::HiHat,
        Layer::Snare,
        Layer::Bass,
        Layer::Pad,
        Layer::Arp,
        Layer::Lead,
    ];

    /// Bus index of this layer.
    pub fn index(self) -> usize {
        match self {
            Layer::Kick => 0,
            Layer::HiHat => 1,
            Layer::Snare => 2,
            Layer::Bass => 3,
            Layer::Pad => 4,
            Layer::Arp => 5,
            Layer::Lead => 6,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Layer::Kick => "kick",
            Layer::HiHat => "hihat",
            Layer::Snare => "snare",
            Layer::Bass => "bass",
            Layer::Pad => "pad",
            Layer::Arp => "arp",
            Layer::Lead => "lead",
        }
    }

    /// Gain of this layer at intensity `i`, before volume scaling.
    ///
    /// Thresholded layers are clamped at zero below their threshold.
    pub fn level(self, i: f64) -> f64 {
        match self {
            Layer::Kick => 0.4 + i * 0.3,
            Layer::HiHat => ((i - 0.2) * 0.5).max(0.0),
            Layer::Snare => ((i - 0.4) * 0.6).max(0.0),
            Layer::Bass => 0.5 + i * 0.3,
            Layer::Pad => 0.25 + i * 0.15,
            Layer::Arp => ((i - 0.3) * 0.4).max(0.0),
            Layer::Lead => ((i - 0.5) * 0.35).max(0.0),
        }
    }
}

/// One gain per layer bus.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayerMix {
    gains: [f32; Layer::COUNT],
}

impl LayerMix {
    /// All buses muted.
    pub const SILENT: LayerMix = LayerMix {
        gains: [0.0; Layer::COUNT],
    };

    /// Project intensity `i` and `volume` (music × master) onto the buses.
    pub fn compute(i: f64, volume: f64) -> Self {
        let mut gains = [0.0; Layer::COUNT];
        for layer in Layer::ALL {
            gains[layer.index()] = (volume * layer.level(i)) as f32;
        }
        Self { gains }
    }

    pub fn gain(&self, layer: Layer) -> f32 {
        self.gains[layer.index()]
    }

    pub fn gains(&self) -> &[f32; Layer::COUNT] {
        &self.gains
    }
}
