//! Shared fixtures for hierarchy-view integration tests
#![allow(dead_code)]

use hierarchy_view::{
    Hierarchy, HierarchyBuilder, HierarchyChange, HierarchyListener, LevelDefinition, LocalId,
    MemorySource,
};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;

/// Two-level fixture: projects P1/P2, tasks C1..C3 (C1, C2 under P1)
pub struct ProjectFixture {
    pub projects: Arc<MemorySource>,
    pub tasks: Arc<MemorySource>,
    pub hierarchy: Hierarchy,
}

pub fn project_fixture() -> ProjectFixture {
    let projects = Arc::new(
        MemorySource::new(["title", "budget"])
            .with_row("P1", json!({"title": "Apollo", "budget": 300}))
            .with_row("P2", json!({"title": "Gemini", "budget": 100})),
    );
    let tasks = Arc::new(
        MemorySource::new(["summary", "project", "hours"])
            .with_sortable(["summary", "hours"])
            .with_row("C1", json!({"summary": "design", "project": "P1", "hours": 8}))
            .with_row("C2", json!({"summary": "build", "project": "P1", "hours": 20}))
            .with_row("C3", json!({"summary": "launch", "project": "P2", "hours": 5})),
    );

    let hierarchy = HierarchyBuilder::new(["name", "cost"])
        .level(LevelDefinition::root(projects.clone(), ["title", "budget"]))
        .level(LevelDefinition::child(1, tasks.clone(), "project", ["summary", "hours"]))
        .build()
        .unwrap();

    ProjectFixture {
        projects,
        tasks,
        hierarchy,
    }
}

/// Three-level fixture: regions → stores → orders, orders linked by
/// entity-like objects
pub struct RetailFixture {
    pub regions: Arc<MemorySource>,
    pub stores: Arc<MemorySource>,
    pub orders: Arc<MemorySource>,
    pub hierarchy: Hierarchy,
}

pub fn retail_fixture() -> RetailFixture {
    let regions = Arc::new(
        MemorySource::new(["name"])
            .with_row("north", json!({"name": "North"}))
            .with_row("south", json!({"name": "South"}))
            .with_row("west", json!({"name": "West"})),
    );
    let stores = Arc::new(
        MemorySource::new(["label", "region"])
            .with_row(10, json!({"label": "N-1", "region": "north"}))
            .with_row(11, json!({"label": "N-2", "region": "north"}))
            .with_row(20, json!({"label": "S-1", "region": "south"})),
    );
    let orders = Arc::new(
        MemorySource::new(["ref", "store", "total"])
            .with_row("o1", json!({"ref": "A-100", "store": {"id": 10}, "total": 12.5}))
            .with_row("o2", json!({"ref": "A-101", "store": {"id": 11}, "total": 3.0}))
            .with_row("o3", json!({"ref": "A-102", "store": {"id": 11}, "total": 7.25}))
            .with_row("o4", json!({"ref": "A-103", "store": {"id": 20}, "total": 40.0})),
    );

    let hierarchy = HierarchyBuilder::new(["name"])
        .level(LevelDefinition::root(regions.clone(), ["name"]))
        .level(LevelDefinition::child(1, stores.clone(), "region", ["label"]))
        .level(LevelDefinition::child(2, orders.clone(), "store", ["ref"]))
        .build()
        .unwrap();

    RetailFixture {
        regions,
        stores,
        orders,
        hierarchy,
    }
}

pub fn local_ids(hierarchy: &Hierarchy, parent: &hierarchy_view::HierarchicalId) -> Vec<LocalId> {
    hierarchy.children(parent).local_ids()
}

/// Records every aggregated change it receives
#[derive(Default)]
pub struct ChangeRecorder {
    pub changes: Mutex<Vec<HierarchyChange>>,
}

impl ChangeRecorder {
    pub fn count(&self) -> usize {
        self.changes.lock().len()
    }

    pub fn last(&self) -> Option<HierarchyChange> {
        self.changes.lock().last().cloned()
    }
}

impl HierarchyListener for ChangeRecorder {
    fn on_hierarchy_change(&self, change: &HierarchyChange) {
        self.changes.lock().push(change.clone());
    }
}
