//! In-memory radar volume
//!
//! A [`VolumeModel`] is built once per input file by
//! [`MdvReader`](crate::mdv::MdvReader) and handed to the Rainbow writer. It
//! owns every decoded header plus one dense grid per retained field.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use ndarray::{s, ArrayView2, Array3};
use serde::Serialize;

use crate::mdv::{
    ElevationList, FieldHeader, MasterHeader, RadarParams, VlevelHeader, VolumeHeaders,
};

/// Decoded physical values of one field, shape `(nz, ny, nx)`
pub type FieldGrid = Array3<f32>;

/// Decoded MDV volume
#[derive(Debug, Clone)]
pub struct VolumeModel {
    /// Master header
    pub master: MasterHeader,
    /// Field headers, in file order
    pub field_headers: Vec<FieldHeader>,
    /// Vlevel headers, parallel to `field_headers`
    pub vlevel_headers: Vec<VlevelHeader>,
    /// Radar parameters from the chunk table
    pub radar_params: Option<RadarParams>,
    /// Elevation angles from the chunk table
    pub elevations: Option<ElevationList>,
    grids: BTreeMap<String, FieldGrid>,
}

/// Header-only view of a volume, for inspection output
#[derive(Debug, Clone, Serialize)]
pub struct VolumeSummary<'a> {
    /// Master header
    pub master: &'a MasterHeader,
    /// Field headers
    pub fields: &'a [FieldHeader],
    /// Vlevel headers
    pub vlevels: &'a [VlevelHeader],
    /// Radar parameters
    pub radar_params: Option<&'a RadarParams>,
    /// Elevation angles
    pub elevations: Option<&'a ElevationList>,
    /// Names of the fields holding decoded grids
    pub decoded_fields: Vec<&'a str>,
}

impl VolumeModel {
    /// Create a volume with no decoded grids yet
    pub fn new(
        headers: VolumeHeaders,
        radar_params: Option<RadarParams>,
        elevations: Option<ElevationList>,
    ) -> Self {
        Self {
            master: headers.master,
            field_headers: headers.fields,
            vlevel_headers: headers.vlevels,
            radar_params,
            elevations,
            grids: BTreeMap::new(),
        }
    }

    /// Store the decoded grid of a field, replacing any earlier one
    pub fn insert_grid(&mut self, name: impl Into<String>, grid: FieldGrid) {
        self.grids.insert(name.into(), grid);
    }

    /// Decoded grid of a field
    pub fn grid(&self, name: &str) -> Option<&FieldGrid> {
        self.grids.get(name)
    }

    /// Names of all decoded fields, sorted
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.grids.keys().map(String::as_str)
    }

    /// Header and vlevel header of a field by short name
    pub fn field(&self, name: &str) -> Option<(&FieldHeader, &VlevelHeader)> {
        let index = self
            .field_headers
            .iter()
            .position(|h| h.field_name == name)?;
        Some((&self.field_headers[index], self.vlevel_headers.get(index)?))
    }

    /// One level of a decoded field as a `(ny, nx)` view
    pub fn level(&self, name: &str, level: usize) -> Option<ArrayView2<'_, f32>> {
        let grid = self.grids.get(name)?;
        if level >= grid.dim().0 {
            return None;
        }
        Some(grid.slice(s![level, .., ..]))
    }

    /// Volume start time
    pub fn begin_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.master.time_begin, 0)
    }

    /// Elevation angle of each sweep of `field`.
    ///
    /// The elevation chunk wins; without one the field's vlevel values are used.
    pub fn elevation_angles(&self, field: &str) -> Vec<f32> {
        if let Some(list) = self.elevations.as_ref().filter(|l| !l.is_empty()) {
            return list.angles.clone();
        }
        self.field(field)
            .map(|(_, vlevel)| vlevel.levels.clone())
            .unwrap_or_default()
    }

    /// Header-only summary for serialization
    pub fn summary(&self) -> VolumeSummary<'_> {
        VolumeSummary {
            master: &self.master,
            fields: &self.field_headers,
            vlevels: &self.vlevel_headers,
            radar_params: self.radar_params.as_ref(),
            elevations: self.elevations.as_ref(),
            decoded_fields: self.field_names().collect(),
        }
    }
}
