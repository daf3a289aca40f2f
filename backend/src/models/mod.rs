//! Domain models that need no I/O: index catalog, AOI geometry and date ranges.

pub mod dates;
pub mod geometry;
pub mod indices;

pub use dates::{suggest_end_date, DateRange, DateRangeError, DateRangeWarning};
pub use geometry::{parse_pasted_coordinates, AreaOfInterest, BoundingBox, InputError, PastedPolygon};
pub use indices::{
    catalog, filter_for_sensor, format_stat_value, index_info, is_valid_for, short_name,
    IndexInfo, LANDSAT_INDICES, SENTINEL2_INDICES, TRUE_COLOR,
};
