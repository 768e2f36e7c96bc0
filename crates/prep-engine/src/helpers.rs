//! Formulas shared by the primary calculation and the titration points.

/// Spike-in and buffer formulas parameterised by the options and derived
/// concentrations they depend on.
///
/// Built from values the primary calculation has already derived and handed
/// to sub-calculators explicitly, so every caller evaluates the same
/// arithmetic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Helpers {
    /// Whether a spike-in control is used.
    pub use_spike_in_control: bool,
    /// Whether the first chemistry version is selected.
    pub chemistry_v1: bool,
    /// Spike-in concentration as a fraction of the template concentration.
    pub spike_in_percent_of_template: f64,
    /// Concentration of the spike-in in its dilution.
    pub spike_in_concentration_in_dilution: f64,
}

impl Helpers {
    /// Spike-in concentration accompanying `concentration_on_plate`.
    pub fn spike_in_concentration_on_plate(&self, concentration_on_plate: f64) -> f64 {
        concentration_on_plate * self.spike_in_percent_of_template
    }

    /// Volume of spike-in dilution needed in `total_volume` of complex.
    pub fn spike_in_volume_in_dilution(&self, concentration_on_plate: f64, total_volume: f64) -> f64 {
        if !self.use_spike_in_control {
            return 0.0;
        }
        self.spike_in_concentration_on_plate(concentration_on_plate) * total_volume
            / self.spike_in_concentration_in_dilution
    }

    /// Buffer volume left once binding reaction and spike-in are accounted for.
    ///
    /// The first chemistry version adds its spike-in during binding, so it is
    /// not subtracted here.
    pub fn buffer_needed(&self, total_volume: f64, binding_volume: f64, spike_in_volume: f64) -> f64 {
        let result = total_volume - binding_volume;
        if !self.chemistry_v1 && self.use_spike_in_control {
            result - spike_in_volume
        } else {
            result
        }
    }

    /// Binding reaction volume delivering `concentration_on_plate` in
    /// `total_volume`.
    pub fn binding_reaction_volume(
        &self,
        concentration_on_plate: f64,
        total_volume: f64,
        sample_concentration_in_binding: f64,
    ) -> f64 {
        concentration_on_plate * total_volume / sample_concentration_in_binding
    }
}
