//! Sample plate well allocation.
//!
//! Cells are loaded from wells of diluted complex. A full well serves a
//! fixed number of cells; the remainder goes into one partial well whose
//! volume depends on whether complex is reused across cycles. The inverse
//! direction answers how many cells a given volume can serve, using the
//! same geometry so both directions agree.

use prep_core::bucket::Bucket;
use prep_core::numeric::{gaussian_round, trunc_int};

/// Plate geometry resolved from a bucket and the reuse option.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlateLayout {
    volume_per_chip: f64,
    dead_volume: f64,
    max_cells_per_well: f64,
    max_volume_per_well: f64,
    volume_per_cycle: f64,
    cells_per_cycle: f64,
    reuse: bool,
}

impl PlateLayout {
    /// Resolves the geometry for `bucket`.
    pub fn new(bucket: &Bucket, reuse: bool) -> Self {
        let (max_cells, max_volume) = if reuse {
            (
                bucket.max_number_of_cells_per_well_with_reuse,
                bucket.max_volume_per_well_with_reuse,
            )
        } else {
            (
                bucket.max_number_of_cells_per_well_no_reuse,
                bucket.max_volume_per_well_no_reuse,
            )
        };
        Self {
            volume_per_chip: bucket.volume_per_chip_no_reuse,
            dead_volume: bucket.dead_volume_per_well,
            max_cells_per_well: trunc_int(max_cells),
            max_volume_per_well: trunc_int(max_volume),
            volume_per_cycle: bucket.volume_of_diluted_sample_per_reuse_cycle,
            cells_per_cycle: bucket.max_number_of_cells_per_reuse_cycle,
            reuse,
        }
    }

    /// Cells served by one full well.
    pub fn max_cells_per_well(&self) -> f64 {
        self.max_cells_per_well
    }

    /// Volume held by one full well.
    pub fn max_volume_per_well(&self) -> f64 {
        self.max_volume_per_well
    }

    /// Whether complex is reused across cycles.
    pub fn reuse(&self) -> bool {
        self.reuse
    }

    /// Volume of the partial well serving the cells left over after
    /// `full_wells` full wells.
    ///
    /// With reuse, remainders of 0, 1 or 2 cells past whole cycles are the
    /// only shapes a well can take; anything else yields `NaN`.
    pub fn volume_in_partial_wells(&self, cells: f64, full_wells: f64) -> f64 {
        if cells == 0.0 {
            return 0.0;
        }

        if !self.reuse {
            let remainder = trunc_int(cells % self.max_cells_per_well);
            if remainder == 0.0 {
                return 0.0;
            }
            return self.volume_per_chip * remainder + self.dead_volume;
        }

        let remainder = cells - full_wells * self.max_cells_per_well;
        if remainder == 0.0 {
            return 0.0;
        }
        let cycles = trunc_int(remainder / self.cells_per_cycle);
        let modulo = remainder % self.cells_per_cycle;
        if modulo == 0.0 {
            self.volume_per_cycle * cycles + self.dead_volume
        } else if modulo == 1.0 {
            self.volume_per_cycle * cycles + self.volume_per_chip + self.dead_volume
        } else if modulo == 2.0 {
            self.volume_per_cycle * (cycles + 1.0) + self.dead_volume
        } else {
            f64::NAN
        }
    }

    /// Cells a partial well holding `volume` can serve.
    pub fn cells_from_partial_volume(&self, volume: f64) -> f64 {
        if volume < self.dead_volume {
            return 0.0;
        }
        let usable = gaussian_round(volume, 2) - self.dead_volume;

        if !self.reuse {
            return trunc_int(usable / self.volume_per_chip);
        }

        let cycles = trunc_int(usable / self.volume_per_cycle);
        let mut cells = trunc_int(self.cells_per_cycle * cycles);
        let remaining = usable - cycles * self.volume_per_cycle;
        if remaining >= self.volume_per_chip {
            cells += 1.0;
        }
        cells
    }

    /// Number of completely filled wells for `cells`.
    pub fn number_of_full_wells(&self, cells: f64) -> f64 {
        let wells = cells / self.max_cells_per_well;
        if wells.is_nan() {
            return wells;
        }
        trunc_int(wells)
    }

    /// Volume held by the full wells.
    pub fn volume_from_full_wells(&self, cells: f64) -> f64 {
        self.number_of_full_wells(cells) * self.max_volume_per_well
    }

    /// Cells served by the full wells.
    pub fn number_of_cells_from_full_wells(&self, cells: f64) -> f64 {
        trunc_int(self.number_of_full_wells(cells)) * trunc_int(self.max_cells_per_well)
    }

    /// Cells left for the partial well.
    pub fn number_of_cells_from_partial_wells(&self, cells: f64) -> f64 {
        trunc_int(cells - self.number_of_cells_from_full_wells(cells))
    }

    /// Volume of the partial well.
    pub fn volume_from_partial_wells(&self, cells: f64) -> f64 {
        let full_wells = self.number_of_full_wells(cells);
        self.volume_in_partial_wells(cells, full_wells)
    }

    /// Total diluted complex volume needed for `cells`.
    pub fn volume_for_cells(&self, cells: f64) -> f64 {
        self.volume_from_full_wells(cells) + self.volume_from_partial_wells(cells)
    }

    /// Cells a total volume of diluted complex can serve.
    pub fn cells_for_volume(&self, volume: f64) -> f64 {
        let full_wells = trunc_int(volume / self.max_volume_per_well);
        let partial = volume - full_wells * self.max_volume_per_well;
        full_wells * self.max_cells_per_well + self.cells_from_partial_volume(partial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prep_core::catalog::Constants;
    use prep_core::options::ProtocolType;

    fn layout(protocol: ProtocolType, reuse: bool) -> PlateLayout {
        let constants = Constants::builtin();
        let bucket = constants
            .buckets
            .find(10_000.0, protocol, "VersionP4", "CellVersion3")
            .unwrap()
            .clone();
        PlateLayout::new(&bucket, reuse)
    }

    #[test]
    fn single_chip_without_reuse() {
        let plate = layout(ProtocolType::Standard, false);
        assert_eq!(plate.volume_in_partial_wells(1.0, 0.0), 15.0);
        assert_eq!(plate.volume_in_partial_wells(0.0, 0.0), 0.0);
        assert_eq!(plate.volume_in_partial_wells(8.0, 1.0), 0.0);
    }

    #[test]
    fn reuse_remainders() {
        let plate = layout(ProtocolType::Standard, true);
        assert_eq!(plate.volume_in_partial_wells(1.0, 0.0), 15.0);
        assert_eq!(plate.volume_in_partial_wells(2.0, 0.0), 20.0);
        assert_eq!(plate.volume_in_partial_wells(3.0, 0.0), 20.0);
        assert_eq!(plate.volume_in_partial_wells(4.0, 0.0), 30.0);
        assert!(plate.volume_in_partial_wells(2.5, 0.0).is_nan());
    }

    #[test]
    fn partial_volume_inverse() {
        let plate = layout(ProtocolType::Standard, true);
        assert_eq!(plate.cells_from_partial_volume(4.0), 0.0);
        assert_eq!(plate.cells_from_partial_volume(30.0), 4.0);
        let plate = layout(ProtocolType::Standard, false);
        assert_eq!(plate.cells_from_partial_volume(35.0), 3.0);
    }

    #[test]
    fn full_wells_split() {
        let plate = layout(ProtocolType::Standard, false);
        assert_eq!(plate.number_of_full_wells(20.0), 2.0);
        assert_eq!(plate.volume_from_full_wells(20.0), 170.0);
        assert_eq!(plate.number_of_cells_from_full_wells(20.0), 16.0);
        assert_eq!(plate.number_of_cells_from_partial_wells(20.0), 4.0);
        assert_eq!(plate.volume_from_partial_wells(20.0), 45.0);
        assert!(plate.number_of_full_wells(f64::NAN).is_nan());
    }
}
