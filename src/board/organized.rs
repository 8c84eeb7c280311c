// Copyright 2026 Tobin Edwards
//
//    Licensed under the Apache License, Version 2.0 (the "License");
//    you may not use this file except in compliance with the License.
//    You may obtain a copy of the License at
//
//        http://www.apache.org/licenses/LICENSE-2.0
//
//    Unless required by applicable law or agreed to in writing, software
//    distributed under the License is distributed on an "AS IS" BASIS,
//    WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//    See the License for the specific language governing permissions and
//    limitations under the License.

//! The organized piece store: a columnar arena of positions in which all
//! pieces of one material occupy a contiguous index range, plus the two
//! indices every legality question is answered from: a coordinate map for
//! point lookups and, per slide vector, buckets of the pieces sharing each
//! slide line. Registration keeps all views consistent; the change journal
//! is the only writer.

use num_bigint::BigInt;
use num_traits::Zero;
use std::collections::{HashMap, HashSet};

use super::coords::{Coord, LineKey, Vector};
use super::material::{Material, Player};

/// A piece as handed around the legality pipeline: a value copy of its
/// material and coordinates plus its offset inside the material's index
/// range. The arena remains the source of truth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub material: Material,
    pub coords: Coord,
    pub index: usize,
}

/// Contiguous index range `[start, end)` of one material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRange {
    pub start: usize,
    pub end: usize,
}

impl TypeRange {
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn contains(&self, abs: usize) -> bool {
        abs >= self.start && abs < self.end
    }
}

/// Spare vacant slots appended to every growable range so a promotion or
/// editor insertion rarely forces a regeneration.
const SPARE_SLOTS: usize = 8;

#[derive(Debug, Clone)]
pub struct OrganizedPieces {
    x_positions: Vec<BigInt>,
    y_positions: Vec<BigInt>,
    /// Materials in range order; ranges are contiguous and cover the arrays.
    ranges: Vec<(Material, TypeRange)>,
    /// Vacant absolute indices per material, ascending.
    undefineds: HashMap<Material, Vec<usize>>,
    /// Materials whose range may be expanded by regeneration.
    growable: HashSet<Material>,
    coords: HashMap<Coord, usize>,
    lines: HashMap<Vector, HashMap<LineKey, Vec<usize>>>,
    slides: Vec<Vector>,
}

impl OrganizedPieces {
    /// Build the store from an initial position. `slides` is the set of
    /// active slide vectors; `growable` the materials that may later gain
    /// pieces (promotion targets, or everything in editor mode).
    pub fn process_initial_position(
        position: &HashMap<Coord, Material>,
        slides: Vec<Vector>,
        growable: HashSet<Material>,
    ) -> Self {
        let mut grouped: HashMap<Material, Vec<Coord>> = HashMap::new();
        for (coord, material) in position {
            grouped.entry(*material).or_default().push(coord.clone());
        }
        let mut materials: Vec<Material> = grouped
            .keys()
            .copied()
            .chain(growable.iter().copied())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        materials.sort();

        let mut store = Self {
            x_positions: Vec::new(),
            y_positions: Vec::new(),
            ranges: Vec::new(),
            undefineds: HashMap::new(),
            growable,
            coords: HashMap::new(),
            lines: HashMap::new(),
            slides,
        };
        for material in materials {
            let coords = grouped.remove(&material).unwrap_or_default();
            store.append_range(material, coords);
        }
        store
    }

    fn append_range(&mut self, material: Material, mut coords: Vec<Coord>) {
        coords.sort();
        let start = self.x_positions.len();
        let spare = if self.growable.contains(&material) {
            SPARE_SLOTS
        } else {
            0
        };
        for coord in &coords {
            self.x_positions.push(coord.x.clone());
            self.y_positions.push(coord.y.clone());
        }
        let vacant_from = self.x_positions.len();
        for _ in 0..spare {
            self.x_positions.push(BigInt::zero());
            self.y_positions.push(BigInt::zero());
        }
        let end = self.x_positions.len();
        self.ranges.push((material, TypeRange { start, end }));
        if spare > 0 {
            self.undefineds
                .insert(material, (vacant_from..end).collect());
        }
        for abs in start..vacant_from {
            self.register_piece_in_space(abs);
        }
    }

    #[inline]
    pub fn slides(&self) -> &[Vector] {
        &self.slides
    }

    pub fn type_range(&self, material: Material) -> Option<&TypeRange> {
        self.ranges
            .iter()
            .find(|(m, _)| *m == material)
            .map(|(_, range)| range)
    }

    pub fn material_at(&self, abs: usize) -> Material {
        self.ranges
            .iter()
            .find(|(_, range)| range.contains(abs))
            .map(|(material, _)| *material)
            .expect("material_at: index outside every range")
    }

    pub fn coord_at(&self, abs: usize) -> Coord {
        Coord::new(self.x_positions[abs].clone(), self.y_positions[abs].clone())
    }

    /// The piece at an occupied absolute index.
    pub fn piece_at_index(&self, abs: usize) -> Piece {
        let material = self.material_at(abs);
        let range = self.type_range(material).unwrap();
        Piece {
            material,
            coords: self.coord_at(abs),
            index: abs - range.start,
        }
    }

    pub fn absolute_index(&self, piece: &Piece) -> usize {
        let range = self
            .type_range(piece.material)
            .expect("absolute_index: unknown material");
        range.start + piece.index
    }

    pub fn index_at(&self, coord: &Coord) -> Option<usize> {
        self.coords.get(coord).copied()
    }

    pub fn piece_at(&self, coord: &Coord) -> Option<Piece> {
        self.index_at(coord).map(|abs| self.piece_at_index(abs))
    }

    pub fn is_occupied(&self, coord: &Coord) -> bool {
        self.coords.contains_key(coord)
    }

    #[inline]
    pub fn piece_count(&self) -> usize {
        self.coords.len()
    }

    fn is_vacant_slot(&self, material: Material, abs: usize) -> bool {
        self.undefineds
            .get(&material)
            .is_some_and(|list| list.binary_search(&abs).is_ok())
    }

    /// Every piece, in ascending index order (deterministic).
    pub fn iter_pieces(&self) -> impl Iterator<Item = Piece> + '_ {
        self.ranges.iter().flat_map(move |(material, range)| {
            (range.start..range.end)
                .filter(move |abs| !self.is_vacant_slot(*material, *abs))
                .map(move |abs| Piece {
                    material: *material,
                    coords: self.coord_at(abs),
                    index: abs - range.start,
                })
        })
    }

    pub fn pieces_of(&self, player: Player) -> impl Iterator<Item = Piece> + '_ {
        self.iter_pieces()
            .filter(move |piece| piece.material.player() == player)
    }

    pub fn royals_of(&self, player: Player) -> Vec<Piece> {
        self.pieces_of(player)
            .filter(|piece| piece.material.is_royal())
            .collect()
    }

    /// Canonical identifier of the slide line through `point` under
    /// `vector`; equal for two points iff they share the line.
    pub fn get_key_from_line(vector: Vector, point: &Coord) -> LineKey {
        LineKey::from_line(vector, point)
    }

    /// The bucket of pieces on the slide line through `point`, if any.
    pub fn line_bucket(&self, vector: Vector, point: &Coord) -> Option<&Vec<usize>> {
        let key = Self::get_key_from_line(vector, point);
        self.lines.get(&vector)?.get(&key)
    }

    /// Insert a piece into the coordinate map and every line bucket.
    /// The slot must already hold the piece's position.
    pub fn register_piece_in_space(&mut self, abs: usize) {
        let coord = self.coord_at(abs);
        let replaced = self.coords.insert(coord.clone(), abs);
        if let Some(other) = replaced {
            panic!("register_piece_in_space: square {coord} already holds index {other}");
        }
        for i in 0..self.slides.len() {
            let vector = self.slides[i];
            let key = Self::get_key_from_line(vector, &coord);
            let bucket = self
                .lines
                .entry(vector)
                .or_default()
                .entry(key)
                .or_default();
            match bucket.binary_search(&abs) {
                Ok(_) => panic!("register_piece_in_space: index {abs} already in bucket"),
                Err(pos) => bucket.insert(pos, abs),
            }
        }
    }

    /// Remove a piece from the coordinate map and every line bucket.
    pub fn remove_piece_from_space(&mut self, abs: usize) {
        let coord = self.coord_at(abs);
        let removed = self.coords.remove(&coord);
        debug_assert_eq!(removed, Some(abs), "remove_piece_from_space: map skew");
        for i in 0..self.slides.len() {
            let vector = self.slides[i];
            let key = Self::get_key_from_line(vector, &coord);
            let Some(buckets) = self.lines.get_mut(&vector) else {
                continue;
            };
            if let Some(bucket) = buckets.get_mut(&key) {
                if let Ok(pos) = bucket.binary_search(&abs) {
                    bucket.remove(pos);
                }
                if bucket.is_empty() {
                    buckets.remove(&key);
                }
            }
        }
    }

    pub fn set_position(&mut self, abs: usize, coord: &Coord) {
        self.x_positions[abs] = coord.x.clone();
        self.y_positions[abs] = coord.y.clone();
    }

    pub fn zero_position(&mut self, abs: usize) {
        self.x_positions[abs] = BigInt::zero();
        self.y_positions[abs] = BigInt::zero();
    }

    /// Take the lowest vacant slot of `material`, regenerating the store
    /// if the range is exhausted and the material tolerates additions.
    pub fn acquire_index(&mut self, material: Material) -> usize {
        if let Some(list) = self.undefineds.get_mut(&material) {
            if !list.is_empty() {
                return list.remove(0);
            }
        }
        if !self.growable.contains(&material) {
            panic!("acquire_index: no vacant slot for non-growable {material:?}");
        }
        self.regenerate_lists();
        self.undefineds
            .get_mut(&material)
            .expect("regenerate_lists left no slack")
            .remove(0)
    }

    /// Take a specific vacant slot back out of the free list. Reversing a
    /// delete must revive the piece at its original index, not the lowest.
    pub fn reclaim_index(&mut self, material: Material, abs: usize) {
        let list = self
            .undefineds
            .get_mut(&material)
            .unwrap_or_else(|| panic!("reclaim_index: no free list for {material:?}"));
        match list.binary_search(&abs) {
            Ok(pos) => {
                list.remove(pos);
            }
            Err(_) => panic!("reclaim_index: slot {abs} is not vacant"),
        }
    }

    /// Return a now-vacant absolute index to its material's free list.
    pub fn release_index(&mut self, material: Material, abs: usize) {
        let list = self.undefineds.entry(material).or_default();
        match list.binary_search(&abs) {
            Ok(_) => panic!("release_index: {abs} already vacant"),
            Err(pos) => list.insert(pos, abs),
        }
    }

    /// Rebuild the arrays with fresh spare capacity in every growable
    /// range. Surviving pieces keep their relative index within their
    /// material, so `Piece` values remain valid across the call.
    pub fn regenerate_lists(&mut self) {
        let old_ranges = std::mem::take(&mut self.ranges);
        let old_x = std::mem::take(&mut self.x_positions);
        let old_y = std::mem::take(&mut self.y_positions);
        let old_undefineds = std::mem::take(&mut self.undefineds);
        self.coords.clear();
        self.lines.clear();

        for (material, range) in old_ranges {
            let start = self.x_positions.len();
            let vacant = old_undefineds.get(&material);
            let mut fresh_vacant: Vec<usize> = Vec::new();
            for abs in range.start..range.end {
                let new_abs = self.x_positions.len();
                self.x_positions.push(old_x[abs].clone());
                self.y_positions.push(old_y[abs].clone());
                if vacant.is_some_and(|list| list.binary_search(&abs).is_ok()) {
                    fresh_vacant.push(new_abs);
                }
            }
            if self.growable.contains(&material) {
                for _ in 0..SPARE_SLOTS {
                    let new_abs = self.x_positions.len();
                    self.x_positions.push(BigInt::zero());
                    self.y_positions.push(BigInt::zero());
                    fresh_vacant.push(new_abs);
                }
            }
            let end = self.x_positions.len();
            let occupied: Vec<usize> = (start..end)
                .filter(|abs| fresh_vacant.binary_search(abs).is_err())
                .collect();
            self.ranges.push((material, TypeRange { start, end }));
            if !fresh_vacant.is_empty() {
                self.undefineds.insert(material, fresh_vacant);
            }
            for abs in occupied {
                self.register_piece_in_space(abs);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::material::RawType;

    fn small_position() -> HashMap<Coord, Material> {
        HashMap::from([
            (Coord::at(5, 1), Material::WK),
            (Coord::at(8, 1), Material::WR),
            (Coord::at(1, 1), Material::WR),
            (Coord::at(5, 8), Material::BK),
            (Coord::at(4, 2), Material::WP),
        ])
    }

    fn standard_slides() -> Vec<Vector> {
        vec![Vector::RIGHT, Vector::UP, Vector::DIAG_UP, Vector::DIAG_DOWN]
    }

    #[test]
    fn test_point_lookup() {
        let store = OrganizedPieces::process_initial_position(
            &small_position(),
            standard_slides(),
            HashSet::new(),
        );
        let king = store.piece_at(&Coord::at(5, 1)).unwrap();
        assert_eq!(king.material, Material::WK);
        assert_eq!(king.coords, Coord::at(5, 1));
        assert!(store.piece_at(&Coord::at(6, 6)).is_none());
        assert_eq!(store.piece_count(), 5);
    }

    #[test]
    fn test_rank_bucket_holds_all_rank_pieces() {
        let store = OrganizedPieces::process_initial_position(
            &small_position(),
            standard_slides(),
            HashSet::new(),
        );
        let bucket = store
            .line_bucket(Vector::RIGHT, &Coord::at(5, 1))
            .expect("rank 1 bucket");
        assert_eq!(bucket.len(), 3);
        assert!(bucket.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_remove_and_reregister_round_trip() {
        let mut store = OrganizedPieces::process_initial_position(
            &small_position(),
            standard_slides(),
            HashSet::new(),
        );
        let abs = store.index_at(&Coord::at(8, 1)).unwrap();
        store.remove_piece_from_space(abs);
        assert!(store.piece_at(&Coord::at(8, 1)).is_none());
        assert_eq!(
            store
                .line_bucket(Vector::RIGHT, &Coord::at(5, 1))
                .unwrap()
                .len(),
            2
        );
        store.register_piece_in_space(abs);
        assert!(store.piece_at(&Coord::at(8, 1)).is_some());
        assert_eq!(
            store
                .line_bucket(Vector::RIGHT, &Coord::at(5, 1))
                .unwrap()
                .len(),
            3
        );
    }

    #[test]
    fn test_acquire_release_index() {
        let growable = HashSet::from([Material::WQ]);
        let mut store = OrganizedPieces::process_initial_position(
            &small_position(),
            standard_slides(),
            growable,
        );
        let abs = store.acquire_index(Material::WQ);
        store.set_position(abs, &Coord::at(4, 8));
        store.register_piece_in_space(abs);
        assert_eq!(store.piece_at(&Coord::at(4, 8)).unwrap().material, Material::WQ);
        store.remove_piece_from_space(abs);
        store.zero_position(abs);
        store.release_index(Material::WQ, abs);
        let again = store.acquire_index(Material::WQ);
        assert_eq!(abs, again, "lowest slot is reused first");
    }

    #[test]
    fn test_regeneration_grows_exhausted_range() {
        let growable = HashSet::from([Material::WQ]);
        let mut store = OrganizedPieces::process_initial_position(
            &small_position(),
            standard_slides(),
            growable,
        );
        let mut placed = Vec::new();
        for i in 0..(SPARE_SLOTS + 3) {
            let abs = store.acquire_index(Material::WQ);
            let coord = Coord::at(20 + i as i64, 20);
            store.set_position(abs, &coord);
            store.register_piece_in_space(abs);
            placed.push(coord);
        }
        for coord in &placed {
            assert_eq!(store.piece_at(coord).unwrap().material, Material::WQ);
        }
        // Pieces from before the regeneration are still addressable.
        let king = store.piece_at(&Coord::at(5, 1)).unwrap();
        assert_eq!(king.material, Material::WK);
        assert_eq!(store.absolute_index(&king), store.index_at(&Coord::at(5, 1)).unwrap());
    }

    #[test]
    fn test_iter_pieces_is_deterministic() {
        let store = OrganizedPieces::process_initial_position(
            &small_position(),
            standard_slides(),
            HashSet::new(),
        );
        let first: Vec<Coord> = store.iter_pieces().map(|p| p.coords).collect();
        let second: Vec<Coord> = store.iter_pieces().map(|p| p.coords).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 5);
    }

    #[test]
    fn test_knightrider_bucket_separates_lattices() {
        let position = HashMap::from([
            (Coord::at(0, 0), Material::white(RawType::Knightrider)),
            (Coord::at(4, 2), Material::BP),
            (Coord::at(3, 2), Material::BP),
        ]);
        let store = OrganizedPieces::process_initial_position(
            &position,
            vec![Vector::new(2, 1)],
            HashSet::new(),
        );
        let bucket = store
            .line_bucket(Vector::new(2, 1), &Coord::at(0, 0))
            .unwrap();
        // (4,2) rides the same (2,1) line as (0,0); (3,2) does not.
        assert_eq!(bucket.len(), 2);
    }
}
