//! Names of every derived field the engine can produce.

use std::fmt;

macro_rules! field_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $(
                #[allow(missing_docs)]
                $variant,
            )*
        }

        impl $name {
            /// Every field in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant,)*];

            /// Field name as it appears in the output record.
            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant),)*
                }
            }
        }
    };
}

field_enum! {
    /// Fields of the primary sample calculation.
    SampleField {
        SpikeInStockConcentration,
        MaxNumberOfCellsPerWellFromBucket,
        MaxVolumePerWellFromBucket,
        SampleConcentrationOnCell,
        SampleConcentrationInAnnealingReaction,
        DilutedPrimerConcentration,
        DefaultPolymeraseTemplateRatio,
        MinimumSampleConcentration,
        DefaultSpikeInRatioToTemplate,
        DefaultSpikeInRatioToTemplatePercent,
        BucketSize,
        VolumePerChipNoReuse,
        PrimerToTemplateRatio,
        StartingSequencingPrimerBufferConcentration,
        MinimumVolumeOfDilutedPrimer,
        ControlTubeNameInKit,
        TubeNameSpikeInControl,
        TubeNamePolymerase,
        TubeNameBindingBuffer,
        TubeNameDtt,
        TubeNameComplexStorageBuffer,
        TubeNameComplexDilutionBuffer,
        TubeNameSequencingPrimer,
        TubeNameNucleotides,
        SpikeInTubeLabel,
        PolymeraseTubeLabel,
        SpikeInTubeInsertSize,
        PolymeraseTubeInsertSize,
        MinimumVolumeOfBindingReaction,
        MaxVolumePerWell,
        MaxNumberOfCellsPerWell,
        SampleConcentrationInBinding,
        VolumeOfAnnealingReactionInBindingFromDesiredCells,
        DefaultConcentrationOnPlate,
        SampleVolumeInAnnealingReaction,
        TotalVolumeOfAnnealingReactionNonStandard,
        TotalVolumeOfAnnealingReaction,
        PrimerVolumeInAnnealingReactionNonStandard,
        PrimerVolumeInAnnealingReaction,
        StockPrimerAliquot,
        ElutionBuffer,
        TotalVolumeOfDilutedPrimer,
        VolumeOfPbInAnnealingReaction,
        VolumeOfWaterInAnnealingReaction,
        StartingSampleConcentrationInNanoMolar,
        FinalAnnealedConcentrationNonStandard,
        FinalAnnealedConcentration,
        DefaultNonStandardAnnealingConcentration,
        NonStandardAnnealingConcentration,
        MaxAvailableAnnealingConcentration,
        MaxAvailableAnnealingConcentrationInBinding,
        SpikeInFirstDilutionConcentration,
        StorageComplexConcentration,
        ConcentrationOnPlate,
        SpikeInPercentOfTemplateConcentration,
        SpikeInSecondDilutionConcentration,
        PolymeraseTemplateRatio,
        TotalVolumeOfFirstSpikeInDilution,
        SpikeInStockVolumeInFirstDilution,
        PolymeraseDilutionConcentration,
        BindingBufferInFirstDilution,
        BindingBufferInSecondDilution,
        TotalVolumeOfSecondSpikeInDilution,
        BindingBufferInPolymeraseDilution,
        DilutedSpikeInVolumeInSecondDilution,
        PolymeraseStockVolumeInDilution,
        TotalVolumeOfPolymeraseDilution,
        PolymeraseStockConcentration,
        VolumeAvailableOfAnnealingReactionInBinding,
        DeadVolumePerWell,
        TotalVolumeOfBindingReaction,
        VolumeOfSpikeInDilutionInBinding,
        VolumeOfAnnealingReactionInBinding,
        VolumeOfAnalogsInBinding,
        VolumeOfPolymeraseDilutionInBinding,
        VolumeOfDttInBinding,
        BindingBufferInBinding,
        FinalBindingConcentration,
        NumberOfCellsFromBinding,
        MaxNumberOfCellsFromBinding,
        DttVolumeInSpikeInDilution,
        ComplexDilutionBufferVolumeInSpikeInDilution,
        SpikeInControlContribution,
        SpikeInControlVolumeInDilution,
        SpikeInDilutionVolume,
        SpikeInConcentrationInSpikeInDilution,
        VolumeOfSpikeInDilutionInComplexDilution,
        BindingComplexBufferName,
        ComplexDilutionBufferName,
        VolumeFromFullWells,
        NumberOfCellsFromFullWells,
        VolumeFromPartialWells,
        NumberOfFullWells,
        NumberOfCellsFromPartialWells,
        NumberOfPartialWells,
        TotalComplexDilutionCells,
        TotalComplexDilutionVolume,
        VolumeOfComplexDilutionBufferInComplexDilution,
        VolumeOfDttInComplexDilution,
        VolumeOfBindingReactionInComplexDilution,
        ShortDescription,
        DefaultVolumeOfBindingReactionInStorageComplex,
        VolumeOfBindingReactionInStorageComplex,
        VolumeOfDttInStorageComplex,
        VolumeOfComplexDilutionBufferInStorageComplex,
        TotalVolumeOfStorageComplex,
        FinalStorageConcentration,
        TitrationTotal,
    }
}

impl SampleField {
    /// Returns `false` for working values that never leave the engine.
    pub fn is_exported(self) -> bool {
        !matches!(
            self,
            SampleField::TotalVolumeOfAnnealingReactionNonStandard
                | SampleField::PrimerVolumeInAnnealingReactionNonStandard
                | SampleField::FinalAnnealedConcentrationNonStandard
        )
    }
}

field_enum! {
    /// Fields of one titration point; exported with the point number appended.
    TitrationField {
        TitrationTotal,
        TitrationBindingComplex,
        TitrationSpikeInVolume,
        TitrationBufferNeeded,
        TitrationDtt,
        TitrationComplexDilutionBuffer,
    }
}

impl TitrationField {
    /// Returns `false` for working values that never leave the engine.
    pub fn is_exported(self) -> bool {
        self != TitrationField::TitrationBufferNeeded
    }
}

field_enum! {
    /// Fields of one magnetic bead preparation.
    MagBeadField {
        MagBeadOriginalBoundSampleConcentration,
        MagBeadIntermediateDilutionConcentration,
        FinalBeadedSampleConcentration,
        MagBeadSaltProposal,
        MagBeadSpikeInDilutionVolumeOfFirstStockSpikeIn,
        MagBeadSpikeInDilutionVolumeOfFirstBindingBuffer,
        MagBeadSpikeInDilutionVolumeOfSecondBindingBuffer,
        MagBeadSpikeInDilutionVolumeOfFirstDilution,
        MagBeadComplexDilutionVolumeOfFirstBindingBuffer,
        MagBeadComplexDilutionVolumeOfFirstComplex,
        MagBeadComplexDilutionVolumeOfSaltBuffer,
        MagBeadComplexDilutionVolumeOfSecondBindingBuffer,
        MagBeadComplexDilutionVolumeOfSpikeInDilution,
        MagBeadComplexDilutionVolumeOfSecondComplex,
        MagBeadComplexDilutionVolumeTotal,
        BeadWashVolumeOfBeads,
        BeadWashVolumeOfBeadWashBuffer,
        BeadWashVolumeOfBeadBindingBuffer,
        ComplexBeadIncubationVolumeOfWashedBeads,
        ComplexBeadIncubationVolumeOfComplex,
        ComplexBeadWashVolumeOfFirstBindingBuffer,
        ComplexBeadWashVolumeOfBeadWashBuffer,
        ComplexBeadWashVolumeOfSecondBindingBuffer,
    }
}

impl MagBeadField {
    /// Returns `false` for working values that never leave the engine.
    pub fn is_exported(self) -> bool {
        !matches!(
            self,
            MagBeadField::MagBeadOriginalBoundSampleConcentration
                | MagBeadField::MagBeadIntermediateDilutionConcentration
                | MagBeadField::FinalBeadedSampleConcentration
                | MagBeadField::MagBeadSaltProposal
        )
    }
}

/// Number of titration points.
pub const TITRATION_POINTS: u8 = 4;

/// Which plate concentration a bead preparation was computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MagBeadVariant {
    /// The regular concentration on plate.
    Standard,
    /// Titration point `n` (1 based).
    Titration(u8),
}

impl MagBeadVariant {
    /// Every variant in export order.
    pub fn all() -> impl Iterator<Item = MagBeadVariant> {
        std::iter::once(MagBeadVariant::Standard)
            .chain((1..=TITRATION_POINTS).map(MagBeadVariant::Titration))
    }
}

/// Any field of the engine's working record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    /// Primary calculation field.
    Sample(SampleField),
    /// Field of titration point `n` (1 based).
    Titration(u8, TitrationField),
    /// Field of a bead preparation variant.
    MagBead(MagBeadVariant, MagBeadField),
}

impl Field {
    /// Output name, carrying the point number or variant prefix.
    pub fn name(self) -> String {
        match self {
            Field::Sample(field) => field.name().to_string(),
            Field::Titration(point, field) => format!("{}{point}", field.name()),
            Field::MagBead(MagBeadVariant::Standard, field) => field.name().to_string(),
            Field::MagBead(MagBeadVariant::Titration(point), field) => {
                format!("Titration{point}{}", field.name())
            }
        }
    }

    /// Returns `true` when the field belongs in the output record.
    pub fn is_exported(self) -> bool {
        match self {
            Field::Sample(field) => field.is_exported(),
            Field::Titration(_, field) => field.is_exported(),
            Field::MagBead(_, field) => field.is_exported(),
        }
    }

    /// Every exported field in output order.
    pub fn exported() -> Vec<Field> {
        let mut fields: Vec<Field> = SampleField::ALL
            .iter()
            .filter(|field| field.is_exported())
            .map(|field| Field::Sample(*field))
            .collect();
        for point in 1..=TITRATION_POINTS {
            fields.extend(
                TitrationField::ALL
                    .iter()
                    .filter(|field| field.is_exported())
                    .map(|field| Field::Titration(point, *field)),
            );
        }
        for variant in MagBeadVariant::all() {
            fields.extend(
                MagBeadField::ALL
                    .iter()
                    .filter(|field| field.is_exported())
                    .map(|field| Field::MagBead(variant, *field)),
            );
        }
        fields
    }
}

impl From<SampleField> for Field {
    fn from(field: SampleField) -> Self {
        Field::Sample(field)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn exported_names_are_unique() {
        let names: Vec<String> = Field::exported().into_iter().map(Field::name).collect();
        let unique: BTreeSet<&String> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
    }

    #[test]
    fn prefixed_names() {
        assert_eq!(
            Field::Titration(3, TitrationField::TitrationDtt).name(),
            "TitrationDtt3"
        );
        assert_eq!(
            Field::MagBead(MagBeadVariant::Titration(2), MagBeadField::BeadWashVolumeOfBeads).name(),
            "Titration2BeadWashVolumeOfBeads"
        );
        assert_eq!(
            Field::MagBead(MagBeadVariant::Standard, MagBeadField::BeadWashVolumeOfBeads).name(),
            "BeadWashVolumeOfBeads"
        );
    }

    #[test]
    fn export_counts() {
        let exported = Field::exported();
        let titration = exported
            .iter()
            .filter(|field| matches!(field, Field::Titration(..)))
            .count();
        let bead = exported
            .iter()
            .filter(|field| matches!(field, Field::MagBead(..)))
            .count();
        assert_eq!(titration, 20);
        assert_eq!(bead, 19 * 5);
        assert!(!exported.contains(&Field::Sample(
            SampleField::TotalVolumeOfAnnealingReactionNonStandard
        )));
    }
}
