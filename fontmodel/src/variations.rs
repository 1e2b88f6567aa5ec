use write_fonts::read::{
    tables::{
        layout::{DeviceOrVariationIndex, VariationIndex},
        variations::ItemVariationStore,
    },
    types::F2Dot14,
    ReadError,
};

/// Applies GDEF item variation deltas at one pinned location.
pub(crate) struct DeltaComputer<'a> {
    ivs: ItemVariationStore<'a>,
    coords: &'a [F2Dot14],
}

impl<'a> DeltaComputer<'a> {
    pub(crate) fn new(ivs: ItemVariationStore<'a>, coords: &'a [F2Dot14]) -> Self {
        DeltaComputer { ivs, coords }
    }

    fn delta(&self, idx: VariationIndex) -> Result<i32, ReadError> {
        self.ivs.compute_delta(idx.into(), self.coords)
    }
}

/// Resolve a default value plus its optional device table at the location
/// of `computer`.
///
/// Hinting device tables are ignored; only variation indices contribute.
pub(crate) fn resolve_value(
    default: Option<i16>,
    device: Option<Result<DeviceOrVariationIndex, ReadError>>,
    computer: Option<&DeltaComputer>,
) -> Result<i32, ReadError> {
    let default = default.unwrap_or_default() as i32;
    let delta = match (device.transpose()?, computer) {
        (Some(DeviceOrVariationIndex::VariationIndex(idx)), Some(computer)) => {
            computer.delta(idx)?
        }
        _ => 0,
    };
    Ok(default + delta)
}

#[cfg(test)]
mod tests {
    use write_fonts::{
        read::{FontData, FontRead},
        tables::{
            layout::Device,
            variations::{
                ivs_builder::VariationStoreBuilder, RegionAxisCoordinates, VariationRegion,
            },
        },
    };

    use super::*;

    // a store with one delta set peaking at the max of a single axis, and
    // the index pointing at it
    fn store_and_index(delta: i32) -> (Vec<u8>, Vec<u8>) {
        let peak = RegionAxisCoordinates::new(
            F2Dot14::from_f32(0.0),
            F2Dot14::from_f32(1.0),
            F2Dot14::from_f32(1.0),
        );
        let mut builder = VariationStoreBuilder::new(1);
        let id = builder.add_deltas(vec![(VariationRegion::new(vec![peak]), delta)]);
        let (store, remap) = builder.build();
        let index = remap.get(id).unwrap();
        (
            write_fonts::dump_table(&store).unwrap(),
            write_fonts::dump_table(&index).unwrap(),
        )
    }

    #[test]
    fn delta_at_location() {
        let (store, index) = store_and_index(100);
        let ivs = ItemVariationStore::read(FontData::new(&store)).unwrap();
        let coords = [F2Dot14::from_f32(0.5)];
        let computer = DeltaComputer::new(ivs, &coords);
        let device = || Some(DeviceOrVariationIndex::read(FontData::new(&index)));

        assert_eq!(resolve_value(Some(10), device(), Some(&computer)).unwrap(), 60);
        // without a store there is nothing to apply
        assert_eq!(resolve_value(Some(10), device(), None).unwrap(), 10);
    }

    #[test]
    fn hinting_devices_are_ignored() {
        let device = write_fonts::dump_table(&Device::new(10, 12, &[1, 2, 3])).unwrap();
        let device = DeviceOrVariationIndex::read(FontData::new(&device));
        assert_eq!(resolve_value(Some(-20), Some(device), None).unwrap(), -20);
        assert_eq!(resolve_value(None, None, None).unwrap(), 0);
    }
}
