/// Entity registry: owns every placed entity and answers spatial queries.
///
/// Ids are handed out monotonically and never reused within a session,
/// so a removed key or door can never come back under the same id.

use crate::domain::entity::{Entity, EntityId, EntityKind, Spawn};
use crate::domain::grid::{Rect, Vec2};

pub struct Registry {
    entities: Vec<Entity>,
    next_id: u32,
}

impl Registry {
    pub fn new() -> Self {
        Registry { entities: Vec::with_capacity(1024), next_id: 1 }
    }

    pub fn spawn(&mut self, s: Spawn) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.entities.push(Entity {
            id,
            kind: s.kind,
            pos: s.pos,
            size: s.size,
            solid: s.solid,
            alpha: s.alpha,
            z: s.z,
        });
        id
    }

    /// Remove one entity. Returns it if it was still present.
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        let idx = self.entities.iter().position(|e| e.id == id)?;
        Some(self.entities.remove(idx))
    }

    /// Remove every entity of a kind. Returns how many were removed.
    pub fn despawn_kind(&mut self, kind: EntityKind) -> usize {
        let before = self.entities.len();
        self.entities.retain(|e| e.kind != kind);
        before - self.entities.len()
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn with_kind(&self, kind: EntityKind) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(move |e| e.kind == kind)
    }

    /// Ids of every entity of `kind` whose bounds overlap `area`.
    pub fn intersecting(&self, kind: EntityKind, area: &Rect) -> Vec<EntityId> {
        self.with_kind(kind)
            .filter(|e| e.bounds().intersects(area))
            .map(|e| e.id)
            .collect()
    }

    /// Hit test: every entity containing `p`, topmost first.
    /// Ties in z keep placement order.
    pub fn at(&self, p: Vec2) -> Vec<&Entity> {
        let mut hits: Vec<&Entity> = self.entities.iter().filter(|e| e.bounds().contains(p)).collect();
        hits.sort_by(|a, b| b.z.total_cmp(&a.z).then(a.id.cmp(&b.id)));
        hits
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.with_kind(kind).count()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::cell_to_world;

    fn tile(kind: EntityKind, col: i32, row: i32, z: f32) -> Spawn {
        Spawn::tile(kind, cell_to_world(col, row), z)
    }

    #[test]
    fn ids_are_never_reused() {
        let mut r = Registry::new();
        let a = r.spawn(tile(EntityKind::Key, 0, 0, 0.0));
        r.despawn(a);
        let b = r.spawn(tile(EntityKind::Key, 0, 0, 0.0));
        assert_ne!(a, b);
        assert!(r.get(a).is_none());
        assert!(r.get(b).is_some());
    }

    #[test]
    fn despawn_missing_is_none() {
        let mut r = Registry::new();
        let a = r.spawn(tile(EntityKind::Door, 5, 7, 1.0));
        assert!(r.despawn(a).is_some());
        assert!(r.despawn(a).is_none());
        assert_eq!(r.len(), 0);
    }

    #[test]
    fn hit_test_orders_topmost_first() {
        let mut r = Registry::new();
        r.spawn(tile(EntityKind::Floor, 5, 1, -1.0));
        r.spawn(tile(EntityKind::Bed, 5, 1, 0.0));
        r.spawn(tile(EntityKind::Key, 5, 1, 0.5));
        r.spawn(tile(EntityKind::Wall, 6, 1, 0.0));
        let kinds: Vec<EntityKind> = r.at(cell_to_world(5, 1)).iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EntityKind::Key, EntityKind::Bed, EntityKind::Floor]);
    }

    #[test]
    fn hit_test_misses_empty_space() {
        let mut r = Registry::new();
        r.spawn(tile(EntityKind::Wall, 0, 0, 0.0));
        assert!(r.at(cell_to_world(3, 3)).is_empty());
    }

    #[test]
    fn despawn_kind_removes_all_instances() {
        let mut r = Registry::new();
        r.spawn(tile(EntityKind::Wall, 0, 0, 0.0));
        r.spawn(tile(EntityKind::Wall, 1, 0, 0.0));
        r.spawn(tile(EntityKind::Door, 2, 0, 1.0));
        assert_eq!(r.despawn_kind(EntityKind::Wall), 2);
        assert_eq!(r.count(EntityKind::Wall), 0);
        assert_eq!(r.count(EntityKind::Door), 1);
    }

    #[test]
    fn intersecting_filters_by_kind_and_overlap() {
        let mut r = Registry::new();
        let k = r.spawn(tile(EntityKind::Key, 5, 1, 0.5));
        r.spawn(tile(EntityKind::Bed, 5, 1, 0.0));
        r.spawn(tile(EntityKind::Key, 7, 1, 0.5));
        let area = Rect::centered(cell_to_world(5, 1), crate::domain::grid::Vec2::new(16.0, 16.0));
        assert_eq!(r.intersecting(EntityKind::Key, &area), vec![k]);
    }
}
