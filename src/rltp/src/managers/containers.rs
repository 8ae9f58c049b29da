//! Container grid resizing.

use serde::Deserialize;
use tracing::{error, info};

use super::ContentManager;
use crate::config::{lenient, ConfigTree};
use crate::context::Context;
use crate::db::Database;
use crate::ids;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContainerResize {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::int")]
    pub height: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub width: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContainersConfig {
    #[serde(deserialize_with = "lenient::lenient")]
    pub enabled: bool,
    #[serde(deserialize_with = "lenient::vec")]
    pub items: Vec<ContainerResize>,
}

#[derive(Debug, Default)]
pub struct ContainersManager {
    config: ContainersConfig,
}

impl ContentManager for ContainersManager {
    fn name(&self) -> &'static str {
        "Containers"
    }

    fn config_name(&self) -> &'static str {
        "ContainersConfig"
    }

    fn load_config(&mut self, tree: &ConfigTree, _ctx: &mut Context) {
        self.config = tree.project(self.config_name());
    }

    fn enabled(&self) -> bool {
        self.config.enabled
    }

    fn post_db(&mut self, db: &mut Database, _ctx: &mut Context) {
        if self.config.items.is_empty() {
            return;
        }

        for resize in &self.config.items {
            let id = resize.id.trim();
            if id.is_empty() {
                continue;
            }
            if !ids::is_valid(id) {
                error!(item = id, "container id is not a valid id");
                continue;
            }
            let Some(template) = db.templates.item_mut(id) else {
                error!(item = id, "container not found");
                continue;
            };
            let Some(grid) = template.props.grids.as_mut().and_then(|g| g.first_mut()) else {
                error!(item = id, "container has no grid");
                continue;
            };
            grid.props.cells_v = resize.height;
            grid.props.cells_h = resize.width;
        }

        info!("Containers changes applied");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ItemTemplate;
    use serde_json::json;

    const CASE: &str = "5c093e3486f77430cb02e593";

    #[test]
    fn test_resize_first_grid() {
        let mut db = Database::default();
        let case: ItemTemplate = serde_json::from_value(json!({
            "_id": CASE,
            "_props": { "Grids": [
                { "_name": "main", "_props": { "cellsH": 4, "cellsV": 4 } },
                { "_name": "side", "_props": { "cellsH": 1, "cellsV": 1 } }
            ] }
        }))
        .unwrap();
        db.templates.items.insert(CASE.to_string(), case);

        let mut manager = ContainersManager::default();
        manager.load_config(
            &ConfigTree::new(json!({
                "enabled": true,
                "items": [
                    { "id": CASE, "height": 10, "width": 8 },
                    { "id": "not-an-id", "height": 1, "width": 1 },
                    { "id": "ffffffffffffffffffffffff", "height": 1, "width": 1 }
                ]
            })),
            &mut Context::default(),
        );
        manager.post_db(&mut db, &mut Context::default());

        let grids = db.templates.items[CASE].props.grids.as_ref().unwrap();
        assert_eq!((grids[0].props.cells_h, grids[0].props.cells_v), (8, 10));
        assert_eq!((grids[1].props.cells_h, grids[1].props.cells_v), (1, 1));
    }
}
