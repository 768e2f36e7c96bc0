use prep_core::catalog::Constants;
use prep_core::options::ProtocolType;
use prep_engine::plate::PlateLayout;
use proptest::prelude::*;

fn layout(protocol: ProtocolType, reuse: bool) -> PlateLayout {
    let constants = Constants::builtin();
    let bucket = constants
        .buckets
        .find(10_000.0, protocol, "VersionP4", "CellVersion3")
        .unwrap();
    PlateLayout::new(bucket, reuse)
}

fn protocol() -> impl Strategy<Value = ProtocolType> {
    prop_oneof![Just(ProtocolType::Standard), Just(ProtocolType::MagBead)]
}

proptest! {
    #[test]
    fn cells_survive_a_volume_round_trip(cells in 0u32..500, reuse in any::<bool>(), protocol in protocol()) {
        let plate = layout(protocol, reuse);
        let cells = cells as f64;
        let back = plate.cells_for_volume(plate.volume_for_cells(cells));
        if reuse {
            // A two cell remainder fills a whole reuse cycle.
            prop_assert!(back >= cells && back <= cells + 1.0);
        } else {
            prop_assert_eq!(back, cells);
        }
    }

    #[test]
    fn full_and_partial_cells_add_up(cells in 0u32..500, reuse in any::<bool>()) {
        let plate = layout(ProtocolType::Standard, reuse);
        let cells = cells as f64;
        let full = plate.number_of_cells_from_full_wells(cells);
        let partial = plate.number_of_cells_from_partial_wells(cells);
        prop_assert_eq!(full + partial, cells);
        prop_assert!(partial < plate.max_cells_per_well());
    }
}
