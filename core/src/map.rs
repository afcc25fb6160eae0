use glam::Vec2;
use serde::Serialize;

use crate::config::MapSettings;
use crate::geometry::distance_to_segment;
use crate::CellCoord;

/// Static layout consumed by the simulation: the enemy path and the build grid.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Map {
    path: Vec<Vec2>,
    columns: u32,
    rows: u32,
    tile_size: f32,
    buildable: Vec<bool>,
}

/// Reasons a map layout is refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    /// The path needs a start and an end.
    #[error("the path needs at least two waypoints")]
    TooFewWaypoints,
    /// The grid has no cells.
    #[error("the grid must have at least one column and one row")]
    EmptyGrid,
    /// Cells need a positive size.
    #[error("tile size must be positive")]
    NonPositiveTileSize,
}

impl Map {
    /// Builds a map, marking every cell whose centre lies within
    /// `path_half_width` of a path segment as unbuildable.
    pub fn new(
        path: Vec<Vec2>,
        columns: u32,
        rows: u32,
        tile_size: f32,
        path_half_width: f32,
    ) -> Result<Self, MapError> {
        if path.len() < 2 {
            return Err(MapError::TooFewWaypoints);
        }
        if columns == 0 || rows == 0 {
            return Err(MapError::EmptyGrid);
        }
        if !(tile_size.is_finite() && tile_size > 0.0) {
            return Err(MapError::NonPositiveTileSize);
        }

        Ok(Self::layout(path, columns, rows, tile_size, path_half_width))
    }

    /// Builds the map described by the provided settings.
    pub fn from_settings(settings: &MapSettings) -> Result<Self, MapError> {
        Self::new(
            waypoints(settings),
            settings.columns,
            settings.rows,
            settings.tile_size,
            settings.path_half_width,
        )
    }

    /// Ordered waypoints enemies walk along.
    #[must_use]
    pub fn path(&self) -> &[Vec2] {
        &self.path
    }

    /// Number of grid columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of grid rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Side length of a grid cell in world units.
    #[must_use]
    pub const fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// Width and height of the playable area in world units.
    #[must_use]
    pub fn bounds(&self) -> Vec2 {
        Vec2::new(
            self.columns as f32 * self.tile_size,
            self.rows as f32 * self.tile_size,
        )
    }

    /// Reports whether the cell lies on the grid.
    #[must_use]
    pub const fn in_bounds(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Reports whether a point lies inside the playable area.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        let bounds = self.bounds();
        point.x >= 0.0 && point.y >= 0.0 && point.x <= bounds.x && point.y <= bounds.y
    }

    /// Reports whether a tower may be built on the cell.
    #[must_use]
    pub fn is_buildable(&self, cell: CellCoord) -> bool {
        self.index(cell)
            .map(|index| self.buildable[index])
            .unwrap_or(false)
    }

    /// Overrides the buildable flag of a cell; cells off the grid are ignored.
    pub fn set_buildable(&mut self, cell: CellCoord, buildable: bool) {
        if let Some(index) = self.index(cell) {
            self.buildable[index] = buildable;
        }
    }

    /// World position of the cell centre.
    #[must_use]
    pub fn cell_center(&self, cell: CellCoord) -> Vec2 {
        Vec2::new(
            (cell.column() as f32 + 0.5) * self.tile_size,
            (cell.row() as f32 + 0.5) * self.tile_size,
        )
    }

    /// Cell containing the provided world position, if it lies on the grid.
    #[must_use]
    pub fn cell_at(&self, point: Vec2) -> Option<CellCoord> {
        if point.x < 0.0 || point.y < 0.0 {
            return None;
        }
        let cell = CellCoord::new(
            (point.x / self.tile_size) as u32,
            (point.y / self.tile_size) as u32,
        );
        self.in_bounds(cell).then_some(cell)
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        self.in_bounds(cell)
            .then(|| cell.row() as usize * self.columns as usize + cell.column() as usize)
    }
}

impl Default for Map {
    fn default() -> Self {
        let settings = MapSettings::default();
        Self::layout(
            waypoints(&settings),
            settings.columns,
            settings.rows,
            settings.tile_size,
            settings.path_half_width,
        )
    }
}

fn waypoints(settings: &MapSettings) -> Vec<Vec2> {
    settings
        .waypoints
        .iter()
        .map(|&[x, y]| Vec2::new(x, y))
        .collect()
}

impl Map {
    /// Lays out an already validated grid around `path`.
    fn layout(path: Vec<Vec2>, columns: u32, rows: u32, tile_size: f32, half_width: f32) -> Self {
        let mut map = Self {
            path,
            columns,
            rows,
            tile_size,
            buildable: vec![true; columns as usize * rows as usize],
        };
        map.mark_path(half_width);
        map
    }

    fn mark_path(&mut self, half_width: f32) {
        for row in 0..self.rows {
            for column in 0..self.columns {
                let cell = CellCoord::new(column, row);
                let centre = self.cell_center(cell);
                let on_path = self
                    .path
                    .windows(2)
                    .any(|segment| distance_to_segment(centre, segment[0], segment[1]) < half_width);
                if on_path {
                    self.set_buildable(cell, false);
                }
            }
        }
    }
}
