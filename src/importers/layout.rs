//! Fixed column layout of the historical price/rent workbooks.
//!
//! ```text
//! Row 0-9:   titles, notes and multi-row headers (ignored)
//! Row 10+:   one row per month
//! Col 1:     year  (only on the first row of each year, merged below)
//! Col 5:     month (only on the first row of each period)
//! Col 7-51:  15 series, three cells each: "(" | value | ")"
//! ```
use serde::{Deserialize, Serialize};
use std::fmt;

/// Property size class as used in the published series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyClass {
    A,
    B,
    C,
    D,
    E,
}

impl PropertyClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyClass::A => "A",
            PropertyClass::B => "B",
            PropertyClass::C => "C",
            PropertyClass::D => "D",
            PropertyClass::E => "E",
        }
    }
}

impl fmt::Display for PropertyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "Hong Kong")]
    HongKong,
    #[serde(rename = "Kowloon")]
    Kowloon,
    #[serde(rename = "New Territories")]
    NewTerritories,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::HongKong => "Hong Kong",
            Region::Kowloon => "Kowloon",
            Region::NewTerritories => "New Territories",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One (class, region) series and the three cells it occupies in a data row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesLabel {
    pub class: PropertyClass,
    pub region: Region,
    pub left_marker_col: usize,
    pub value_col: usize,
    pub right_marker_col: usize,
}

impl SeriesLabel {
    const fn at(class: PropertyClass, region: Region, first_col: usize) -> Self {
        Self {
            class,
            region,
            left_marker_col: first_col,
            value_col: first_col + 1,
            right_marker_col: first_col + 2,
        }
    }
}

use PropertyClass::{A, B, C, D, E};
use Region::{HongKong, Kowloon, NewTerritories};

/// All 15 series in sheet order
pub const SERIES_LABELS: [SeriesLabel; 15] = [
    SeriesLabel::at(A, HongKong, 7),
    SeriesLabel::at(A, Kowloon, 10),
    SeriesLabel::at(A, NewTerritories, 13),
    SeriesLabel::at(B, HongKong, 16),
    SeriesLabel::at(B, Kowloon, 19),
    SeriesLabel::at(B, NewTerritories, 22),
    SeriesLabel::at(C, HongKong, 25),
    SeriesLabel::at(C, Kowloon, 28),
    SeriesLabel::at(C, NewTerritories, 31),
    SeriesLabel::at(D, HongKong, 34),
    SeriesLabel::at(D, Kowloon, 37),
    SeriesLabel::at(D, NewTerritories, 40),
    SeriesLabel::at(E, HongKong, 43),
    SeriesLabel::at(E, Kowloon, 46),
    SeriesLabel::at(E, NewTerritories, 49),
];

/// Where the data lives in a worksheet
#[derive(Debug, Clone, Copy)]
pub struct SheetLayout {
    pub data_start_row: usize,
    pub year_col: usize,
    pub month_col: usize,
    pub labels: &'static [SeriesLabel],
}

impl SheetLayout {
    /// Layout of the "His Data.xls" price and rent series
    pub const HISTORICAL: SheetLayout = SheetLayout {
        data_start_row: 10,
        year_col: 1,
        month_col: 5,
        labels: &SERIES_LABELS,
    };
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self::HISTORICAL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_cover_every_class_region_pair_once() {
        let mut seen = std::collections::HashSet::new();
        for label in SERIES_LABELS.iter() {
            assert!(seen.insert((label.class, label.region)));
        }
        assert_eq!(seen.len(), 15);
    }

    #[test]
    fn test_label_columns_are_contiguous() {
        for (i, label) in SERIES_LABELS.iter().enumerate() {
            assert_eq!(label.left_marker_col, 7 + 3 * i);
            assert_eq!(label.value_col, 8 + 3 * i);
            assert_eq!(label.right_marker_col, 9 + 3 * i);
        }
        assert_eq!(SERIES_LABELS[14].right_marker_col, 51);
    }

    #[test]
    fn test_region_serializes_to_display_name() {
        let json = serde_json::to_string(&Region::NewTerritories).unwrap();
        assert_eq!(json, "\"New Territories\"");
        assert_eq!(serde_json::to_string(&PropertyClass::C).unwrap(), "\"C\"");
    }
}
